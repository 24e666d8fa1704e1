//! Well-known directory lookup.
//!
//! Each host family has its own [`SearchPathProvider`]; all of them read the
//! environment through an [`EnvSource`] so tests can supply a fixed map.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

////////////////////////////////////////////////////////////////////////////////
// #region Vocabulary

/// Well-known location roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchPathDirectory {
    Application,
    DemoApplication,
    DeveloperApplication,
    AdminApplication,
    Library,
    Developer,
    User,
    Documentation,
    Document,
    CoreService,
    AutosavedInformation,
    Desktop,
    Caches,
    ApplicationSupport,
    Downloads,
    InputMethods,
    Movies,
    Music,
    Pictures,
    PrinterDescription,
    SharedPublic,
    PreferencePanes,
    ItemReplacement,
    AllApplications,
    AllLibraries,
    Trash,
}

impl SearchPathDirectory {
    pub const ALL: [SearchPathDirectory; 26] = [
        Self::Application,
        Self::DemoApplication,
        Self::DeveloperApplication,
        Self::AdminApplication,
        Self::Library,
        Self::Developer,
        Self::User,
        Self::Documentation,
        Self::Document,
        Self::CoreService,
        Self::AutosavedInformation,
        Self::Desktop,
        Self::Caches,
        Self::ApplicationSupport,
        Self::Downloads,
        Self::InputMethods,
        Self::Movies,
        Self::Music,
        Self::Pictures,
        Self::PrinterDescription,
        Self::SharedPublic,
        Self::PreferencePanes,
        Self::ItemReplacement,
        Self::AllApplications,
        Self::AllLibraries,
        Self::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::DemoApplication => "demoApplication",
            Self::DeveloperApplication => "developerApplication",
            Self::AdminApplication => "adminApplication",
            Self::Library => "library",
            Self::Developer => "developer",
            Self::User => "user",
            Self::Documentation => "documentation",
            Self::Document => "document",
            Self::CoreService => "coreService",
            Self::AutosavedInformation => "autosavedInformation",
            Self::Desktop => "desktop",
            Self::Caches => "caches",
            Self::ApplicationSupport => "applicationSupport",
            Self::Downloads => "downloads",
            Self::InputMethods => "inputMethods",
            Self::Movies => "movies",
            Self::Music => "music",
            Self::Pictures => "pictures",
            Self::PrinterDescription => "printerDescription",
            Self::SharedPublic => "sharedPublic",
            Self::PreferencePanes => "preferencePanes",
            Self::ItemReplacement => "itemReplacement",
            Self::AllApplications => "allApplications",
            Self::AllLibraries => "allLibraries",
            Self::Trash => "trash",
        }
    }
}

impl fmt::Display for SearchPathDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchPathDirectory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|d| d.as_str() == value)
            .copied()
            .ok_or_else(|| format!("Unknown search path directory: `{value}`"))
    }
}

/// Scope selector. Bits combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchPathDomainMask(u32);

impl SearchPathDomainMask {
    pub const USER: Self = Self(1);
    pub const LOCAL: Self = Self(2);
    pub const NETWORK: Self = Self(4);
    pub const SYSTEM: Self = Self(8);
    pub const ALL: Self = Self(0x0ffff);

    /// Single-domain masks in lookup order.
    pub const ORDERED: [Self; 4] = [Self::USER, Self::LOCAL, Self::NETWORK, Self::SYSTEM];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SearchPathDomainMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SearchPathDomainMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Environment

/// Read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).and_then(|v| v.into_string().ok())
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Non-empty absolute path from `name`.
fn env_abs_path(env: &dyn EnvSource, name: &str) -> Option<PathBuf> {
    let value = env.var(name)?;
    let path = PathBuf::from(value);
    path.is_absolute().then_some(path)
}

fn home_from_env(env: &dyn EnvSource, name: &str) -> Option<PathBuf> {
    env_abs_path(env, name).or_else(|| {
        directories::BaseDirs::new().map(|base_dirs| base_dirs.home_dir().to_path_buf())
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Providers

/// Maps a directory role and domain mask to concrete paths.
///
/// Results follow domain order (user, local, network, system) and contain no
/// duplicates. Unsupported combinations yield an empty list.
pub trait SearchPathProvider: Send + Sync {
    fn urls(&self, directory: SearchPathDirectory, domain: SearchPathDomainMask) -> Vec<PathBuf> {
        let mut l_paths: Vec<PathBuf> = Vec::new();
        for domain_single in SearchPathDomainMask::ORDERED {
            if !domain.contains(domain_single) {
                continue;
            }
            for path in self.urls_in_domain(directory, domain_single) {
                if !l_paths.contains(&path) {
                    l_paths.push(path);
                }
            }
        }
        l_paths
    }

    /// Paths for exactly one domain bit.
    fn urls_in_domain(
        &self,
        directory: SearchPathDirectory,
        domain: SearchPathDomainMask,
    ) -> Vec<PathBuf>;
}

/// freedesktop.org base directories for Linux and other non-Darwin unix.
#[derive(Debug, Clone, Default)]
pub struct XdgSearchPaths<E = ProcessEnv> {
    env: E,
}

impl XdgSearchPaths<ProcessEnv> {
    pub fn new() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: EnvSource> XdgSearchPaths<E> {
    pub fn with_env(env: E) -> Self {
        Self { env }
    }

    fn home(&self) -> Option<PathBuf> {
        home_from_env(&self.env, "HOME")
    }

    fn base_or_home(&self, name: &str, suffix: &str) -> Option<PathBuf> {
        env_abs_path(&self.env, name).or_else(|| self.home().map(|h| h.join(suffix)))
    }

    fn data_home(&self) -> Option<PathBuf> {
        self.base_or_home("XDG_DATA_HOME", ".local/share")
    }

    fn cache_home(&self) -> Option<PathBuf> {
        self.base_or_home("XDG_CACHE_HOME", ".cache")
    }

    fn config_home(&self) -> Option<PathBuf> {
        self.base_or_home("XDG_CONFIG_HOME", ".config")
    }

    fn data_dirs(&self) -> Vec<PathBuf> {
        let value = self
            .env
            .var("XDG_DATA_DIRS")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        value
            .split(':')
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .collect()
    }

    /// `XDG_*_DIR` variable, then `user-dirs.dirs`, then `$HOME/<name>`.
    fn user_dir(&self, key: &str, name_default: &str) -> Option<PathBuf> {
        let name_var = format!("XDG_{key}_DIR");
        if let Some(path) = env_abs_path(&self.env, &name_var) {
            return Some(path);
        }
        let home = self.home()?;
        let path_user_dirs = self.config_home().map(|p| p.join("user-dirs.dirs"));
        if let Some(path) = path_user_dirs
            .and_then(|path_file| read_user_dirs_file(&path_file, &name_var, &home))
        {
            return Some(path);
        }
        Some(home.join(name_default))
    }
}

impl<E: EnvSource> SearchPathProvider for XdgSearchPaths<E> {
    fn urls_in_domain(
        &self,
        directory: SearchPathDirectory,
        domain: SearchPathDomainMask,
    ) -> Vec<PathBuf> {
        use SearchPathDirectory as D;

        if domain == SearchPathDomainMask::LOCAL {
            return match directory {
                D::Caches => vec![PathBuf::from("/var/cache")],
                D::ApplicationSupport => self.data_dirs(),
                D::User => self.home().into_iter().collect(),
                _ => Vec::new(),
            };
        }
        if domain != SearchPathDomainMask::USER {
            return Vec::new();
        }

        let path = match directory {
            D::AutosavedInformation => self.data_home().map(|p| p.join("Autosave Information")),
            D::Caches => self.cache_home(),
            D::ApplicationSupport => self.data_home(),
            D::Trash => self.data_home().map(|p| p.join("Trash")),
            D::Desktop => self.user_dir("DESKTOP", "Desktop"),
            D::Document => self.user_dir("DOCUMENTS", "Documents"),
            D::Downloads => self.user_dir("DOWNLOAD", "Downloads"),
            D::Music => self.user_dir("MUSIC", "Music"),
            D::Pictures => self.user_dir("PICTURES", "Pictures"),
            D::Movies => self.user_dir("VIDEOS", "Videos"),
            D::SharedPublic => self.user_dir("PUBLICSHARE", "Public"),
            _ => None,
        };
        path.into_iter().collect()
    }
}

/// Parse `NAME="$HOME/dir"` lines of a `user-dirs.dirs` file.
fn read_user_dirs_file(path_file: &Path, name_var: &str, home: &Path) -> Option<PathBuf> {
    let text = fs::read_to_string(path_file).ok()?;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        if name.trim() != name_var {
            continue;
        }
        let value = value.trim().trim_matches('"');
        if let Some(rest) = value.strip_prefix("$HOME") {
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                // A folder equal to $HOME means "disabled".
                return None;
            }
            return Some(home.join(rest));
        }
        let path = PathBuf::from(value);
        return path.is_absolute().then_some(path);
    }
    None
}

/// Apple domain layout rooted at `~`, `/`, `/Network` and `/System`.
#[derive(Debug, Clone, Default)]
pub struct DarwinSearchPaths<E = ProcessEnv> {
    env: E,
}

impl DarwinSearchPaths<ProcessEnv> {
    pub fn new() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: EnvSource> DarwinSearchPaths<E> {
    pub fn with_env(env: E) -> Self {
        Self { env }
    }

    fn domain_root(&self, domain: SearchPathDomainMask) -> Option<PathBuf> {
        match domain {
            SearchPathDomainMask::USER => home_from_env(&self.env, "HOME"),
            SearchPathDomainMask::LOCAL => Some(PathBuf::from("/")),
            SearchPathDomainMask::NETWORK => Some(PathBuf::from("/Network")),
            SearchPathDomainMask::SYSTEM => Some(PathBuf::from("/System")),
            _ => None,
        }
    }
}

/// Suffix under the domain root, or `None` when the domain has no such folder.
fn darwin_suffix(
    directory: SearchPathDirectory,
    domain: SearchPathDomainMask,
) -> Option<&'static str> {
    use SearchPathDirectory as D;
    use SearchPathDomainMask as M;

    let b_user = domain == M::USER;
    let b_network = domain == M::NETWORK;
    let b_system = domain == M::SYSTEM;
    match directory {
        D::Application => Some("Applications"),
        D::DemoApplication => Some("Applications/Demos"),
        D::DeveloperApplication => Some("Developer/Applications"),
        D::AdminApplication => Some("Applications/Utilities"),
        D::Library => Some("Library"),
        D::Developer => Some("Developer"),
        D::Documentation => Some("Library/Documentation"),
        D::InputMethods => Some("Library/Input Methods"),
        D::ApplicationSupport => Some("Library/Application Support"),
        D::User if !b_user && !b_system => Some("Users"),
        D::CoreService if b_system => Some("Library/CoreServices"),
        D::PrinterDescription if b_system => Some("Library/Printers/PPDs"),
        D::Caches if !b_network => Some("Library/Caches"),
        D::PreferencePanes if !b_network => Some("Library/PreferencePanes"),
        D::Document if b_user => Some("Documents"),
        D::AutosavedInformation if b_user => Some("Library/Autosave Information"),
        D::Desktop if b_user => Some("Desktop"),
        D::Downloads if b_user => Some("Downloads"),
        D::Movies if b_user => Some("Movies"),
        D::Music if b_user => Some("Music"),
        D::Pictures if b_user => Some("Pictures"),
        D::SharedPublic if b_user => Some("Public"),
        D::Trash if b_user => Some(".Trash"),
        _ => None,
    }
}

impl<E: EnvSource> SearchPathProvider for DarwinSearchPaths<E> {
    fn urls_in_domain(
        &self,
        directory: SearchPathDirectory,
        domain: SearchPathDomainMask,
    ) -> Vec<PathBuf> {
        use SearchPathDirectory as D;

        let l_directories: &[SearchPathDirectory] = match directory {
            D::AllApplications => &[
                D::Application,
                D::AdminApplication,
                D::DeveloperApplication,
                D::DemoApplication,
            ],
            D::AllLibraries => &[D::Library, D::Developer],
            _ => std::slice::from_ref(&directory),
        };
        let Some(path_root) = self.domain_root(domain) else {
            return Vec::new();
        };
        l_directories
            .iter()
            .filter_map(|d| darwin_suffix(*d, domain))
            .map(|suffix| path_root.join(suffix))
            .collect()
    }
}

/// Known-folder layout derived from the Windows profile variables.
#[derive(Debug, Clone, Default)]
pub struct WindowsSearchPaths<E = ProcessEnv> {
    env: E,
}

impl WindowsSearchPaths<ProcessEnv> {
    pub fn new() -> Self {
        Self { env: ProcessEnv }
    }
}

impl<E: EnvSource> WindowsSearchPaths<E> {
    pub fn with_env(env: E) -> Self {
        Self { env }
    }

    fn profile(&self) -> Option<PathBuf> {
        home_from_env(&self.env, "USERPROFILE")
    }

    fn var_or_profile(&self, name: &str, suffix: &str) -> Option<PathBuf> {
        env_abs_path(&self.env, name).or_else(|| self.profile().map(|p| p.join(suffix)))
    }
}

impl<E: EnvSource> SearchPathProvider for WindowsSearchPaths<E> {
    fn urls_in_domain(
        &self,
        directory: SearchPathDirectory,
        domain: SearchPathDomainMask,
    ) -> Vec<PathBuf> {
        use SearchPathDirectory as D;

        if domain == SearchPathDomainMask::LOCAL {
            let path = match directory {
                D::User => self.profile().and_then(|p| p.parent().map(Path::to_path_buf)),
                D::ApplicationSupport => env_abs_path(&self.env, "ProgramData"),
                _ => None,
            };
            return path.into_iter().collect();
        }
        if domain != SearchPathDomainMask::USER {
            return Vec::new();
        }

        let local_app_data = || self.var_or_profile("LOCALAPPDATA", "AppData/Local");
        let path = match directory {
            D::Caches => local_app_data(),
            D::AutosavedInformation => local_app_data().map(|p| p.join("Autosave Information")),
            D::ApplicationSupport => self.var_or_profile("APPDATA", "AppData/Roaming"),
            D::SharedPublic => env_abs_path(&self.env, "PUBLIC").or_else(|| {
                self.profile()
                    .and_then(|p| p.parent().map(|users| users.join("Public")))
            }),
            D::Desktop => self.profile().map(|p| p.join("Desktop")),
            D::Document => self.profile().map(|p| p.join("Documents")),
            D::Downloads => self.profile().map(|p| p.join("Downloads")),
            D::Movies => self.profile().map(|p| p.join("Videos")),
            D::Music => self.profile().map(|p| p.join("Music")),
            D::Pictures => self.profile().map(|p| p.join("Pictures")),
            _ => None,
        };
        path.into_iter().collect()
    }
}

/// Provider for the build target.
pub fn host_search_paths() -> Box<dyn SearchPathProvider> {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        Box::new(DarwinSearchPaths::new())
    }
    #[cfg(windows)]
    {
        Box::new(WindowsSearchPaths::new())
    }
    #[cfg(not(any(target_os = "macos", target_os = "ios", windows)))]
    {
        Box::new(XdgSearchPaths::new())
    }
}

/// Home directory of the current user from the environment, falling back to
/// the platform account database.
pub fn home_directory() -> Option<PathBuf> {
    let name = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    home_from_env(&ProcessEnv, name)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn xdg_variables_override_home() {
        let provider = XdgSearchPaths::with_env(env(&[
            ("HOME", "/home/u"),
            ("XDG_DATA_HOME", "/data"),
            ("XDG_CACHE_HOME", "/cache"),
        ]));
        let user = SearchPathDomainMask::USER;
        assert_eq!(
            provider.urls(SearchPathDirectory::AutosavedInformation, user),
            vec![PathBuf::from("/data/Autosave Information")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::Caches, user),
            vec![PathBuf::from("/cache")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::ApplicationSupport, user),
            vec![PathBuf::from("/data")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn xdg_falls_back_to_home() {
        let provider = XdgSearchPaths::with_env(env(&[("HOME", "/home/u")]));
        let user = SearchPathDomainMask::USER;
        assert_eq!(
            provider.urls(SearchPathDirectory::AutosavedInformation, user),
            vec![PathBuf::from("/home/u/.local/share/Autosave Information")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::Caches, user),
            vec![PathBuf::from("/home/u/.cache")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::Trash, user),
            vec![PathBuf::from("/home/u/.local/share/Trash")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::User, SearchPathDomainMask::LOCAL),
            vec![PathBuf::from("/home/u")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn xdg_relative_values_are_ignored() {
        let provider = XdgSearchPaths::with_env(env(&[
            ("HOME", "/home/u"),
            ("XDG_CACHE_HOME", "relative/cache"),
        ]));
        assert_eq!(
            provider.urls(SearchPathDirectory::Caches, SearchPathDomainMask::USER),
            vec![PathBuf::from("/home/u/.cache")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn xdg_user_dirs_file_is_consulted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path_config = tmp.path().join("config");
        fs::create_dir(&path_config).expect("mkdir");
        fs::write(
            path_config.join("user-dirs.dirs"),
            "# generated\nXDG_DESKTOP_DIR=\"$HOME/Schreibtisch\"\nXDG_MUSIC_DIR=\"$HOME/\"\n",
        )
        .expect("write");
        let provider = XdgSearchPaths::with_env(env(&[
            ("HOME", "/home/u"),
            ("XDG_CONFIG_HOME", path_config.to_str().expect("utf8")),
            ("XDG_PICTURES_DIR", "/pics"),
        ]));
        let user = SearchPathDomainMask::USER;
        assert_eq!(
            provider.urls(SearchPathDirectory::Desktop, user),
            vec![PathBuf::from("/home/u/Schreibtisch")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::Pictures, user),
            vec![PathBuf::from("/pics")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::Music, user),
            vec![PathBuf::from("/home/u/Music")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::Movies, user),
            vec![PathBuf::from("/home/u/Videos")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn xdg_local_domain_uses_system_dirs() {
        let provider = XdgSearchPaths::with_env(env(&[("HOME", "/home/u")]));
        let local = SearchPathDomainMask::LOCAL;
        assert_eq!(
            provider.urls(SearchPathDirectory::Caches, local),
            vec![PathBuf::from("/var/cache")]
        );
        assert_eq!(
            provider.urls(SearchPathDirectory::ApplicationSupport, local),
            vec![PathBuf::from("/usr/local/share"), PathBuf::from("/usr/share")]
        );
    }

    #[test]
    fn every_provider_agrees_on_cross_platform_directories() {
        use SearchPathDirectory as D;

        let l_providers: Vec<Box<dyn SearchPathProvider>> = vec![
            Box::new(XdgSearchPaths::with_env(env(&[("HOME", "/home/u")]))),
            Box::new(DarwinSearchPaths::with_env(env(&[("HOME", "/Users/u")]))),
            Box::new(WindowsSearchPaths::with_env(env(&[(
                "USERPROFILE",
                "/Users/u",
            )]))),
        ];
        let l_always = [
            D::User,
            D::Document,
            D::AutosavedInformation,
            D::Desktop,
            D::Caches,
            D::ApplicationSupport,
            D::Downloads,
            D::Movies,
            D::Music,
            D::Pictures,
            D::SharedPublic,
        ];
        for provider in &l_providers {
            for directory in l_always {
                assert!(
                    !provider.urls(directory, SearchPathDomainMask::ALL).is_empty(),
                    "{directory} should resolve"
                );
            }
            assert!(provider
                .urls(D::ItemReplacement, SearchPathDomainMask::ALL)
                .is_empty());
        }
    }

    #[test]
    fn darwin_only_directories_are_empty_elsewhere() {
        use SearchPathDirectory as D;

        let xdg = XdgSearchPaths::with_env(env(&[("HOME", "/home/u")]));
        let windows = WindowsSearchPaths::with_env(env(&[("USERPROFILE", "/Users/u")]));
        let darwin = DarwinSearchPaths::with_env(env(&[("HOME", "/Users/u")]));
        let l_darwin_only = [
            D::Application,
            D::DemoApplication,
            D::DeveloperApplication,
            D::AdminApplication,
            D::Library,
            D::Developer,
            D::Documentation,
            D::CoreService,
            D::InputMethods,
            D::PreferencePanes,
            D::AllApplications,
            D::AllLibraries,
            D::PrinterDescription,
        ];
        for directory in l_darwin_only {
            assert!(xdg.urls(directory, SearchPathDomainMask::ALL).is_empty());
            assert!(windows.urls(directory, SearchPathDomainMask::ALL).is_empty());
            assert!(!darwin.urls(directory, SearchPathDomainMask::ALL).is_empty());
        }
        assert!(!xdg.urls(D::Trash, SearchPathDomainMask::ALL).is_empty());
        assert!(windows.urls(D::Trash, SearchPathDomainMask::ALL).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn darwin_domains_are_ordered() {
        let darwin = DarwinSearchPaths::with_env(env(&[("HOME", "/Users/u")]));
        assert_eq!(
            darwin.urls(SearchPathDirectory::Caches, SearchPathDomainMask::ALL),
            vec![
                PathBuf::from("/Users/u/Library/Caches"),
                PathBuf::from("/Library/Caches"),
                PathBuf::from("/System/Library/Caches"),
            ]
        );
        assert_eq!(
            darwin.urls(
                SearchPathDirectory::AllLibraries,
                SearchPathDomainMask::USER | SearchPathDomainMask::LOCAL
            ),
            vec![
                PathBuf::from("/Users/u/Library"),
                PathBuf::from("/Users/u/Developer"),
                PathBuf::from("/Library"),
                PathBuf::from("/Developer"),
            ]
        );
        assert_eq!(
            darwin.urls(SearchPathDirectory::Trash, SearchPathDomainMask::ALL),
            vec![PathBuf::from("/Users/u/.Trash")]
        );
    }

    #[test]
    fn domain_mask_combines() {
        let mask = SearchPathDomainMask::USER | SearchPathDomainMask::SYSTEM;
        assert!(mask.contains(SearchPathDomainMask::USER));
        assert!(!mask.contains(SearchPathDomainMask::LOCAL));
        assert_eq!(mask.bits(), 9);
        assert!(SearchPathDomainMask::ALL.contains(SearchPathDomainMask::NETWORK));
        assert_eq!(
            "sharedPublic".parse::<SearchPathDirectory>(),
            Ok(SearchPathDirectory::SharedPublic)
        );
    }
}
