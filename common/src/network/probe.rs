/// Outcome of a single TCP connect attempt.
///
/// Refused, timed out, cancelled and invalid ports all collapse into
/// `open == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub port: i32,
    pub open: bool,
}

impl ProbeResult {
    pub fn open(port: i32) -> Self {
        Self { port, open: true }
    }

    pub fn closed(port: i32) -> Self {
        Self { port, open: false }
    }
}

/// Converts a configured port to a connectable one.
///
/// Port 0 and anything outside `1..=65535` yield `None`.
pub fn valid_port(port: i32) -> Option<u16> {
    u16::try_from(port).ok().filter(|p| *p != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_port_bounds() {
        assert_eq!(valid_port(1), Some(1));
        assert_eq!(valid_port(65535), Some(65535));
        assert_eq!(valid_port(0), None);
        assert_eq!(valid_port(-1), None);
        assert_eq!(valid_port(65536), None);
    }
}
