use log::info;

use super::connection::{serve_connection, ServeOptions};
use super::error::TransportError;
use super::framing::Framing;
use super::invoker::Invoker;

/// stdin/stdout front end
///
/// stdinがEOFになると終了する。
pub struct StdioServer {
    invoker: Invoker,
    options: ServeOptions,
}

impl StdioServer {
    pub fn new(invoker: Invoker, options: ServeOptions) -> Self {
        Self { invoker, options }
    }

    /// LSP-style framing, the usual choice for a child process
    pub fn with_content_length(invoker: Invoker) -> Self {
        Self::new(
            invoker,
            ServeOptions {
                framing: Framing::ContentLength,
                ..ServeOptions::default()
            },
        )
    }

    pub async fn run(self) -> Result<usize, TransportError> {
        info!("Serving on stdio ({:?} framing)", self.options.framing);
        let handled =
            serve_connection(self.invoker, tokio::io::stdin(), tokio::io::stdout(), self.options).await?;
        info!("stdin EOF reached after {} message(s)", handled);
        Ok(handled)
    }
}
