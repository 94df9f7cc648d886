//! Output sink helpers

use std::io::{self, Write};

use tracing::warn;

/// Writes everything to `primary` and mirrors it to `mirror` for diagnostics.
///
/// Only the primary sink's errors are reported; a failing mirror is logged
/// and skipped for the rest of the writer's life.
pub struct MirrorWriter<P, M> {
    primary: P,
    mirror: Option<M>,
}

impl<P: Write, M: Write> MirrorWriter<P, M> {
    pub fn new(primary: P, mirror: M) -> Self {
        Self {
            primary,
            mirror: Some(mirror),
        }
    }

    pub fn into_inner(self) -> P {
        self.primary
    }

    fn mirror_with(&mut self, op: impl FnOnce(&mut M) -> io::Result<()>) {
        if let Some(mirror) = self.mirror.as_mut() {
            if let Err(err) = op(mirror) {
                warn!(error = %err, "mirror sink failed, disabling it");
                self.mirror = None;
            }
        }
    }
}

impl<P: Write, M: Write> Write for MirrorWriter<P, M> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.primary.write(buf)?;
        self.mirror_with(|m| m.write_all(&buf[..n]));
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.mirror_with(|m| m.flush());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "broken"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mirror_receives_copy() {
        let mut mirror = Vec::new();
        let mut writer = MirrorWriter::new(Vec::new(), &mut mirror);
        writer.write_all(b"{\"nodes\":[]}").unwrap();
        let primary = writer.into_inner();
        assert_eq!(primary, mirror);
    }

    #[test]
    fn test_failing_mirror_does_not_fail_primary() {
        let mut writer = MirrorWriter::new(Vec::new(), Broken);
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"def").unwrap();
        assert_eq!(writer.into_inner(), b"abcdef");
    }
}
