//! Operator input read off the async runtime.

use anyhow::Result;
use std::io::{self, BufRead, Cursor, Stdin};

/// A blocking source of input lines.
pub trait LineSource: Send + 'static {
    /// Appends one line to `buf`. Returns 0 at end of input.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl LineSource for Stdin {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        Stdin::read_line(self, buf)
    }
}

impl<T: AsRef<[u8]> + Send + 'static> LineSource for Cursor<T> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Reads the next line on the blocking pool and hands the source back.
/// `None` at end of input.
pub async fn read_line<S: LineSource>(mut source: S) -> Result<(S, Option<String>)> {
    let read = tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        let n = source.read_line(&mut line)?;
        Ok::<_, io::Error>((source, (n > 0).then_some(line)))
    })
    .await??;
    Ok(read)
}
