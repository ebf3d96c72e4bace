use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::time::Duration;

use super::{Sample, SampleSource};

/// Replays recorded readings from a text log.
///
/// Each line is `seconds,ax,ay,az` or `seconds,magnitude`, comma or whitespace
/// separated. Blank lines and lines starting with `#` are skipped. Readings are
/// multiplied by `scale`; timestamps must not go backwards.
pub struct ReplaySource<R> {
    lines: Lines<R>,
    scale: f64,
    line_no: usize,
    last_timestamp: Duration,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path, scale: f64) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open replay file: {}", path.display()))?;
        log::info!("Replaying samples from {}", path.display());
        Ok(Self::new(BufReader::new(file), scale))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R, scale: f64) -> Self {
        Self {
            lines: reader.lines(),
            scale,
            line_no: 0,
            last_timestamp: Duration::ZERO,
        }
    }

    fn parse(&self, line: &str) -> Result<Sample> {
        let fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .map(|f| {
                f.parse::<f64>()
                    .with_context(|| format!("invalid number {:?}", f))
            })
            .collect::<Result<Vec<f64>>>()?;

        let scale = self.scale;
        let sample = match fields[..] {
            [secs, m] => Sample::from_magnitude(m * scale, self.timestamp(secs)?),
            [secs, x, y, z] => {
                Sample::from_axes([x * scale, y * scale, z * scale], self.timestamp(secs)?)
            }
            _ => bail!("expected 2 or 4 fields, found {}", fields.len()),
        };
        Ok(sample)
    }

    fn timestamp(&self, secs: f64) -> Result<Duration> {
        let timestamp = Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid timestamp {}", secs))?;
        if timestamp < self.last_timestamp {
            bail!(
                "timestamp {:.3}s goes back before {:.3}s",
                secs,
                self.last_timestamp.as_secs_f64()
            );
        }
        Ok(timestamp)
    }
}

impl<R: BufRead> SampleSource for ReplaySource<R> {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        while let Some(line) = self.lines.next() {
            self.line_no += 1;
            let line = line.with_context(|| format!("Failed to read line {}", self.line_no))?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let sample = self
                .parse(trimmed)
                .with_context(|| format!("Malformed sample on line {}", self.line_no))?;
            self.last_timestamp = sample.timestamp;
            return Ok(Some(sample));
        }
        Ok(None)
    }
}
