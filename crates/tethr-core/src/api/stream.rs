use futures::stream::{self, Stream};
use reqwest::Response;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{Result, TethrError};

/// Most memory reserved up front from a Content-Length header.
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

fn initial_capacity(content_length: Option<u64>) -> usize {
    content_length
        .map_or(0, |len| usize::try_from(len).unwrap_or(usize::MAX))
        .min(MAX_PREALLOCATION)
}

/// Body of a successful binary download. The caller owns it; dropping it
/// releases the underlying connection.
#[derive(Debug)]
pub struct AudioStream {
    response: Response,
}

impl AudioStream {
    pub(crate) fn new(response: Response) -> Self {
        Self { response }
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Next chunk of the body, or `None` once exhausted.
    pub async fn chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.response.chunk().await?.map(|c| c.to_vec()))
    }

    /// Copy the rest of the body into `writer`, returning the bytes written.
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.response.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| TethrError::ProcessingFailure(format!("Failed to write audio: {e}")))?;
            written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| TethrError::ProcessingFailure(format!("Failed to write audio: {e}")))?;
        Ok(written)
    }

    /// Read the remaining body into memory.
    pub async fn into_vec(mut self) -> Result<Vec<u8>> {
        let mut body = Vec::with_capacity(initial_capacity(self.content_length()));
        while let Some(chunk) = self.response.chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<u8>>> {
        stream::try_unfold(self, |mut s| async move {
            let next = s.chunk().await?;
            Ok::<_, TethrError>(next.map(|chunk| (chunk, s)))
        })
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_capacity_is_capped() {
        assert_eq!(initial_capacity(None), 0);
        assert_eq!(initial_capacity(Some(4096)), 4096);
        assert_eq!(initial_capacity(Some(u64::MAX)), MAX_PREALLOCATION);
        assert_eq!(initial_capacity(Some(MAX_PREALLOCATION as u64 + 1)), MAX_PREALLOCATION);
    }
}
