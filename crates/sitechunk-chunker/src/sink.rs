use std::io::Write;

use crate::error::Result;
use crate::types::Chunk;

/// Destination for emitted chunks.
pub trait ChunkSink {
    /// # Errors
    ///
    /// Returns an error if the chunk cannot be written.
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()>;

    /// Flush buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered data cannot be written out.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ChunkSink for Vec<Chunk> {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        self.push(chunk.clone());
        Ok(())
    }
}

/// Writes one JSON record per line.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for JsonlSink<W> {
    fn write_chunk(&mut self, chunk: &Chunk) -> Result<()> {
        serde_json::to_writer(&mut self.writer, chunk)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.into(),
            text: text.into(),
            metadata: None,
            source: "s".into(),
            sequence_index: 0,
            token_count: 1,
            span: 0..text.len(),
            oversized: false,
        }
    }

    #[test]
    fn jsonl_writes_one_record_per_line() {
        let mut sink = JsonlSink::new(Vec::new());
        sink.write_chunk(&chunk("a-0", "first\nline")).unwrap();
        sink.write_chunk(&chunk("a-1", "second")).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.written(), 2);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "a-0");
        assert_eq!(first["text"], "first\nline");
    }

    #[test]
    fn vec_sink_collects_chunks() {
        let mut sink: Vec<Chunk> = Vec::new();
        sink.write_chunk(&chunk("a-0", "x")).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.len(), 1);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let mut sink = JsonlSink::new(Broken);
        assert!(sink.write_chunk(&chunk("a-0", "x")).is_err());
        assert_eq!(sink.written(), 0);
    }
}
