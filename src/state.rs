use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

const STATE_FILE_PREFIX: &str = ".lastupdate-";

/// The last address successfully published for one domain.
///
/// Each domain gets its own file, `.lastupdate-<domain>`, holding a single
/// dotted-decimal address. An empty or unparseable file means "no previous
/// address" and forces an update.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn for_domain<P: AsRef<Path>>(dir: P, domain: &str) -> Result<Self> {
        let name = domain.trim_end_matches('.');
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(anyhow!("Invalid domain name {:?}", domain));
        }

        Ok(Self {
            path: dir.as_ref().join(format!("{}{}", STATE_FILE_PREFIX, name)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the previous address, creating an empty file on first run.
    pub fn load(&self) -> Result<Option<Ipv4Addr>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Creating empty state file {}", self.path.display());
                self.write("")?;
                String::new()
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read state file {}", self.path.display()))
            }
        };

        let previous = parse_address(raw.trim());
        debug!("{}: previous address {:?}", self.path.display(), previous);
        Ok(previous)
    }

    pub fn store(&self, ip: &Ipv4Addr) -> Result<()> {
        self.write(&ip.to_string())
    }

    fn write(&self, contents: &str) -> Result<()> {
        let mut opts = OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }

        opts.open(&self.path)
            .and_then(|mut f| f.write_all(contents.as_bytes()))
            .with_context(|| format!("Failed to write state file {}", self.path.display()))
    }
}

/// Dotted-decimal, tolerating zero-padded octets such as `203.000.113.005`.
fn parse_address(s: &str) -> Option<Ipv4Addr> {
    if let Ok(ip) = s.parse::<Ipv4Addr>() {
        return Some(ip);
    }

    let mut octets = [0u8; 4];
    let mut parts = s.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }

    Some(Ipv4Addr::from(octets))
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn first_run_creates_empty_file() {
        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();

        assert_eq!(state.load().unwrap(), None);
        assert!(state.path().exists());
        assert_eq!(fs::read_to_string(state.path()).unwrap(), "");
    }

    #[test]
    fn path_is_scoped_to_domain() {
        let state = StateFile::for_domain("/var/lib/ddns", "host.example.com.").unwrap();
        assert_eq!(
            state.path(),
            Path::new("/var/lib/ddns/.lastupdate-host.example.com")
        );
    }

    #[test]
    fn rejects_path_like_domains() {
        assert!(StateFile::for_domain(".", "").is_err());
        assert!(StateFile::for_domain(".", ".").is_err());
        assert!(StateFile::for_domain(".", "../etc/passwd").is_err());
        assert!(StateFile::for_domain(".", "a/b.example.com").is_err());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();
        fs::write(state.path(), "  1.2.3.4\n").unwrap();

        assert_eq!(state.load().unwrap(), Some(Ipv4Addr::new(1, 2, 3, 4)));
    }

    #[test]
    fn zero_padded_octets_are_the_same_address() {
        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();

        for padded in &["203.000.113.005", "203.0.113.05\n", "0203.0.0113.5"] {
            fs::write(state.path(), padded).unwrap();
            assert_eq!(
                state.load().unwrap(),
                Some(Ipv4Addr::new(203, 0, 113, 5)),
                "{:?}",
                padded
            );
        }
    }

    #[test]
    fn garbage_is_no_previous_address() {
        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();

        for junk in &["not an ip", "1.2.3", "::1", "300.1.1.1", "1.2.3.4.5", "1..2.3", "+1.2.3.4"] {
            fs::write(state.path(), junk).unwrap();
            assert_eq!(state.load().unwrap(), None, "{:?}", junk);
        }
    }

    #[test]
    fn store_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();
        fs::write(state.path(), "198.51.100.200\n").unwrap();

        state.store(&Ipv4Addr::new(203, 0, 113, 5)).unwrap();

        assert_eq!(fs::read_to_string(state.path()).unwrap(), "203.0.113.5");
        assert_eq!(state.load().unwrap(), Some(Ipv4Addr::new(203, 0, 113, 5)));
    }

    #[test]
    fn domains_do_not_share_state() {
        let dir = tempdir().unwrap();
        let a = StateFile::for_domain(dir.path(), "a.example.com").unwrap();
        let b = StateFile::for_domain(dir.path(), "b.example.com").unwrap();

        a.store(&Ipv4Addr::new(192, 0, 2, 1)).unwrap();

        assert_eq!(b.load().unwrap(), None);
        assert_eq!(a.load().unwrap(), Some(Ipv4Addr::new(192, 0, 2, 1)));
    }

    #[test]
    fn unreadable_state_is_an_error() {
        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();
        fs::create_dir(state.path()).unwrap();

        let err = state.load().unwrap_err();
        assert!(err.to_string().starts_with("Failed to read state file"));
    }

    #[cfg(unix)]
    #[test]
    fn owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let state = StateFile::for_domain(dir.path(), "host.example.com").unwrap();
        state.load().unwrap();

        let mode = fs::metadata(state.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
