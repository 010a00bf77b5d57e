// Host platform classification for path and environment layout decisions
//
// The classification cannot come from the OS name alone: an MSYS2 or Cygwin
// shell runs on a Windows kernel but expects POSIX layout and paths. The
// emulation layer announces itself through the process environment
// (MSYSTEM, OSTYPE), so that is what gets inspected, once per process.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    /// Windows kernel, native shell, drive-letter paths
    WindowsNative,
    /// Windows kernel under an MSYS2/Cygwin emulation layer
    WindowsPosixEmulation,
    /// Everything else
    Posix,
}

impl PlatformKind {
    /// Directory holding executables inside a virtual environment.
    ///
    /// MSYS2/Cygwin venvs use `bin` despite the Windows host.
    pub fn venv_bin_dir(self) -> &'static str {
        match self {
            PlatformKind::WindowsNative => "Scripts",
            PlatformKind::WindowsPosixEmulation | PlatformKind::Posix => "bin",
        }
    }

    /// Executable suffix inside a virtual environment.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            PlatformKind::WindowsNative => ".exe",
            PlatformKind::WindowsPosixEmulation | PlatformKind::Posix => "",
        }
    }

    /// Whether interpreters on this host may need POSIX-emulation path
    /// translation. Only Windows hosts can run such builds.
    pub fn windows_host(self) -> bool {
        matches!(
            self,
            PlatformKind::WindowsNative | PlatformKind::WindowsPosixEmulation
        )
    }
}

static PLATFORM_KIND: Lazy<PlatformKind> = Lazy::new(|| {
    classify(
        cfg!(windows),
        env::var("MSYSTEM").ok().as_deref(),
        env::var("OSTYPE").ok().as_deref(),
    )
});

/// The platform kind of the running process, computed once.
pub fn platform_kind() -> PlatformKind {
    *PLATFORM_KIND
}

fn classify(windows: bool, msystem: Option<&str>, ostype: Option<&str>) -> PlatformKind {
    if !windows {
        return PlatformKind::Posix;
    }
    let msys = msystem.is_some_and(|value| !value.is_empty());
    let cygwin = ostype.is_some_and(|value| {
        let value = value.to_ascii_lowercase();
        value.contains("cygwin") || value.contains("msys")
    });
    if msys || cygwin {
        PlatformKind::WindowsPosixEmulation
    } else {
        PlatformKind::WindowsNative
    }
}
