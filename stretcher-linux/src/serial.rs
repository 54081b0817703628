//! Raw access to the serial device the telemetry arrives on

use std::{
    fs::OpenOptions,
    io,
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    path::Path,
};

use thiserror::Error;
use tracing::debug;

/// Baud rate of the device UART
pub const DEFAULT_BAUD_RATE: u32 = 9600;

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("io error on serial device: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),
}

/// Terminal speed constant for a baud rate
pub fn baud_rate_speed(baud_rate: u32) -> Option<libc::speed_t> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        460800 => libc::B460800,
        921600 => libc::B921600,
        1000000 => libc::B1000000,
        2000000 => libc::B2000000,
        3000000 => libc::B3000000,
        _ => return None,
    };
    Some(speed)
}

/// Open a telemetry source for reading.
///
/// Terminals are switched to raw mode at `baud_rate`, so every byte is
/// passed through unmodified as soon as it arrives. Other files, such as
/// recorded captures or pipes, are read as they are.
pub fn open(path: &Path, baud_rate: u32) -> Result<tokio::fs::File, SerialError> {
    let speed = baud_rate_speed(baud_rate).ok_or(SerialError::UnsupportedBaudRate(baud_rate))?;

    let file = OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)?;

    let fd = file.as_raw_fd();
    // SAFETY: fd is an open descriptor owned by file
    if unsafe { libc::isatty(fd) } == 1 {
        make_raw(fd, speed)?;
        debug!("Configured {} as raw terminal at {baud_rate} baud", path.display());
    } else {
        debug!("{} is not a terminal, reading as is", path.display());
    }

    Ok(tokio::fs::File::from_std(file))
}

fn make_raw(fd: libc::c_int, speed: libc::speed_t) -> io::Result<()> {
    // SAFETY: termios is plain data, fully initialized by tcgetattr before use
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: fd is open and termios points to a valid termios struct
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: termios is a valid termios struct
    unsafe { libc::cfmakeraw(&mut termios) };
    termios.c_cflag |= libc::CLOCAL | libc::CREAD;
    termios.c_cc[libc::VMIN] = 1;
    termios.c_cc[libc::VTIME] = 0;

    // SAFETY: termios is a valid termios struct
    if unsafe { libc::cfsetspeed(&mut termios, speed) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: fd is open and termios points to a valid termios struct
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        ffi::CStr,
        fs::File,
        io::Write,
        os::fd::{FromRawFd, OwnedFd},
        path::PathBuf,
    };

    use stretcher::decoder::{decode, Event};
    use tokio::io::AsyncReadExt;

    use super::*;

    /// Open a pseudo terminal, returning the controlling side and the path
    /// of the terminal side
    fn pseudo_terminal() -> (File, PathBuf) {
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(master >= 0);
            let master = OwnedFd::from_raw_fd(master);
            assert_eq!(libc::grantpt(master.as_raw_fd()), 0);
            assert_eq!(libc::unlockpt(master.as_raw_fd()), 0);

            let mut name = [0 as libc::c_char; 128];
            assert_eq!(
                libc::ptsname_r(master.as_raw_fd(), name.as_mut_ptr(), name.len()),
                0
            );
            let path = CStr::from_ptr(name.as_ptr()).to_str().unwrap().into();

            (File::from(master), path)
        }
    }

    #[test]
    fn baud_rates() {
        assert_eq!(baud_rate_speed(DEFAULT_BAUD_RATE), Some(libc::B9600));
        assert_eq!(baud_rate_speed(115200), Some(libc::B115200));
        assert_eq!(baud_rate_speed(12345), None);
    }

    #[test]
    fn unsupported_baud_rate() {
        let result = open(Path::new("/dev/null"), 12345);
        assert!(matches!(result, Err(SerialError::UnsupportedBaudRate(12345))));
    }

    #[test]
    fn missing_device() {
        let result = open(Path::new("/nonexistent/ttyUSB1"), DEFAULT_BAUD_RATE);
        assert!(matches!(result, Err(SerialError::Io(_))));
    }

    #[tokio::test]
    async fn terminal_passes_control_bytes() {
        let (mut master, path) = pseudo_terminal();
        let mut port = open(&path, DEFAULT_BAUD_RATE).unwrap();

        // Carriage return, interrupt and end-of-file as measurement nibbles
        let telemetry = [0x80, 0x0D, 0x81, 0x03, 0x81, 0x04, 0x81, 0x81, 0x82];
        master.write_all(&telemetry).unwrap();

        let mut received = [0; 9];
        port.read_exact(&mut received).await.unwrap();
        assert_eq!(received, telemetry);

        let events: Vec<_> = decode(received).collect();
        assert_eq!(
            events,
            [
                Event::StartTraining,
                Event::FinishTraining {
                    measurements: [0xD, 0x3, 0x4]
                },
                Event::StartStretching,
                Event::FinishStretching,
            ]
        );
    }
}
