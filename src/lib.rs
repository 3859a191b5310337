//! Query the tray state of an optical drive through Linux's CD-ROM ioctl
//! interface.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::raw::c_int;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Constants from `<linux/cdrom.h>`.
pub mod sys {
    use std::os::raw::c_int;

    pub const CDROM_DRIVE_STATUS: u32 = 0x5326;

    /// Slot argument selecting the currently loaded disc.
    pub const CDSL_CURRENT: c_int = c_int::MAX;

    pub const CDS_NO_INFO: c_int = 0;
    pub const CDS_NO_DISC: c_int = 1;
    pub const CDS_TRAY_OPEN: c_int = 2;
    pub const CDS_DRIVE_NOT_READY: c_int = 3;
    pub const CDS_DISC_OK: c_int = 4;

    nix::ioctl_write_int_bad!(
        /// `ioctl(fd, CDROM_DRIVE_STATUS, slot)`, returning the `CDS_*` value.
        cdrom_drive_status,
        CDROM_DRIVE_STATUS
    );
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to open device {}. Provide a device name (/dev/sr0, /dev/cdrom) as a parameter.", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("drive status query failed: {0}")]
    Query(#[from] nix::errno::Errno),
}

pub type Result<T> = std::result::Result<T, Error>;

/// State reported by `CDROM_DRIVE_STATUS`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DriveStatus {
    NoInfo,
    NoDisc,
    TrayOpen,
    DriveNotReady,
    DiscOk,
    Unknown(c_int),
}

impl DriveStatus {
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            sys::CDS_NO_INFO => DriveStatus::NoInfo,
            sys::CDS_NO_DISC => DriveStatus::NoDisc,
            sys::CDS_TRAY_OPEN => DriveStatus::TrayOpen,
            sys::CDS_DRIVE_NOT_READY => DriveStatus::DriveNotReady,
            sys::CDS_DISC_OK => DriveStatus::DiscOk,
            other => DriveStatus::Unknown(other),
        }
    }

    ///
    pub fn is_tray_open(self) -> bool {
        self == DriveStatus::TrayOpen
    }
}

/// An open optical drive device node. The descriptor is closed on drop.
#[derive(Debug)]
pub struct Device(File);

impl Device {
    /// Opens `path` read-only and non-blocking, so an empty drive or an
    /// open tray does not stall the open.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Device> {
        let path = path.as_ref();
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map(Device)
            .map_err(|source| {
                debug!(path = %path.display(), error = %source, "open failed");
                Error::Open {
                    path: path.to_path_buf(),
                    source,
                }
            })
    }

    ///
    pub fn drive_status(&self) -> Result<DriveStatus> {
        let raw = unsafe { sys::cdrom_drive_status(self.0.as_raw_fd(), sys::CDSL_CURRENT)? };
        Ok(DriveStatus::from_raw(raw))
    }

    /// A failed query counts as "not open", same as a closed tray.
    pub fn is_tray_open(&self) -> bool {
        match self.drive_status() {
            Ok(status) => {
                debug!(?status, "drive status");
                status.is_tray_open()
            }
            Err(e) => {
                debug!(error = %e, "treating failed status query as not open");
                false
            }
        }
    }
}

impl std::os::unix::io::AsRawFd for Device {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.0.as_raw_fd()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sys() {
        assert_eq!(sys::CDROM_DRIVE_STATUS, 0x5326);
        assert_eq!(sys::CDSL_CURRENT, c_int::MAX);
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(DriveStatus::from_raw(0), DriveStatus::NoInfo);
        assert_eq!(DriveStatus::from_raw(1), DriveStatus::NoDisc);
        assert_eq!(DriveStatus::from_raw(2), DriveStatus::TrayOpen);
        assert_eq!(DriveStatus::from_raw(3), DriveStatus::DriveNotReady);
        assert_eq!(DriveStatus::from_raw(4), DriveStatus::DiscOk);
        assert_eq!(DriveStatus::from_raw(-1), DriveStatus::Unknown(-1));
    }

    #[test]
    fn test_only_tray_open_is_open() {
        for raw in -1..8 {
            let status = DriveStatus::from_raw(raw);
            assert_eq!(status.is_tray_open(), raw == sys::CDS_TRAY_OPEN);
        }
    }

    #[test]
    fn test_open_missing() {
        let err = Device::open("/dev/trayopen-does-not-exist").unwrap_err();
        match &err {
            Error::Open { path, .. } => {
                assert_eq!(path, Path::new("/dev/trayopen-does-not-exist"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "Unable to open device /dev/trayopen-does-not-exist. \
             Provide a device name (/dev/sr0, /dev/cdrom) as a parameter."
        );
    }

    #[test]
    fn test_query_not_a_drive() {
        let device = Device::open("/dev/null").unwrap();
        match device.drive_status() {
            Err(Error::Query(errno)) => assert_eq!(errno, nix::errno::Errno::ENOTTY),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!device.is_tray_open());
    }

    #[test]
    fn test_regular_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let device = Device::open(file.path()).unwrap();
        assert!(device.drive_status().is_err());
        assert!(!device.is_tray_open());
    }

    #[test]
    fn test_open_flags() {
        let device = Device::open("/dev/null").unwrap();
        let flags = unsafe { libc::fcntl(device.as_raw_fd(), libc::F_GETFL) };
        assert_ne!(flags, -1);
        assert_eq!(flags & libc::O_ACCMODE, libc::O_RDONLY);
        assert_ne!(flags & libc::O_NONBLOCK, 0);
    }
}
