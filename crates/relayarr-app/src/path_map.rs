//! Source-side to host-side path translation.
//!
//! # Design
//! - Host-specific mappings are tried before the global list; the first matching prefix wins.
//! - A prefix only matches on a path-component boundary (`/data/tv` does not match `/data/tv2`).
//! - Unmatched paths are returned untouched, matched paths are normalised to the host's separator.

use relayarr_config::{HostConfig, PathMapping};
use relayarr_player_core::{PathStyle, Platform};

/// Translates paths reported by the media manager into paths a media host understands.
#[derive(Debug, Clone, Default)]
pub struct PathMapper {
    global: Vec<PathMapping>,
}

impl PathMapper {
    /// Mapper over the global mapping list.
    #[must_use]
    pub const fn new(global: Vec<PathMapping>) -> Self {
        Self { global }
    }

    /// Host-side path for `source`.
    #[must_use]
    pub fn map(&self, source: &str, host: &HostConfig, platform: Platform) -> String {
        let Some((mapping, rest)) = host
            .path_mapping
            .iter()
            .chain(&self.global)
            .find_map(|mapping| strip_mapping(source, mapping).map(|rest| (mapping, rest)))
        else {
            return source.to_string();
        };

        let target = mapping.target.as_str();
        let style = target_style(target, platform);
        let separator = style.separator();
        let mut mapped = normalise(target, style);
        let rest = rest.trim_start_matches(['/', '\\']);
        if !rest.is_empty() {
            if !mapped.ends_with(separator) {
                mapped.push(separator);
            }
            mapped.push_str(&normalise(rest, style));
        }
        mapped
    }

    /// Host-side directory for `source`, always ending with a separator.
    #[must_use]
    pub fn map_directory(&self, source: &str, host: &HostConfig, platform: Platform) -> String {
        let mut mapped = self.map(source, host, platform);
        if !mapped.ends_with(['/', '\\']) {
            let separator = if is_url(&mapped) {
                '/'
            } else {
                platform
                    .path_style()
                    .unwrap_or_else(|| infer_style(&mapped))
                    .separator()
            };
            mapped.push(separator);
        }
        mapped
    }
}

fn strip_mapping<'a>(source: &'a str, mapping: &PathMapping) -> Option<&'a str> {
    let prefix = mapping.source.as_str();
    let rest = source.strip_prefix(prefix)?;
    let on_boundary = rest.is_empty()
        || rest.starts_with(['/', '\\'])
        || prefix.ends_with(['/', '\\']);
    on_boundary.then_some(rest)
}

fn is_url(path: &str) -> bool {
    path.contains("://")
}

fn target_style(target: &str, platform: Platform) -> PathStyle {
    if is_url(target) {
        return PathStyle::Posix;
    }
    platform
        .path_style()
        .unwrap_or_else(|| infer_style(target))
}

/// Drive letters and backslashes mean Windows, anything else POSIX.
fn infer_style(path: &str) -> PathStyle {
    let bytes = path.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if drive || path.contains('\\') {
        PathStyle::Windows
    } else {
        PathStyle::Posix
    }
}

fn normalise(path: &str, style: PathStyle) -> String {
    match style {
        PathStyle::Posix => path.replace('\\', "/"),
        PathStyle::Windows => path.replace('/', "\\"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayarr_test_support::fixtures::host_config;

    fn mapping(source: &str, target: &str) -> PathMapping {
        PathMapping {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn unmatched_path_is_returned_unchanged() {
        let mapper = PathMapper::new(vec![mapping("/data/tv", "/mnt/tv")]);
        let host = host_config("den", 0);
        assert_eq!(
            mapper.map("/other/Show/S01E01.mkv", &host, Platform::Windows),
            "/other/Show/S01E01.mkv"
        );
    }

    #[test]
    fn first_matching_prefix_wins_and_host_list_goes_first() {
        let mapper = PathMapper::new(vec![
            mapping("/data/tv", "/mnt/tv"),
            mapping("/data", "/mnt/other"),
        ]);
        let mut host = host_config("den", 0);
        assert_eq!(
            mapper.map("/data/tv/Show/S01E01.mkv", &host, Platform::Linux),
            "/mnt/tv/Show/S01E01.mkv"
        );

        host.path_mapping = vec![mapping("/data/tv", "/storage/tv")];
        assert_eq!(
            mapper.map("/data/tv/Show/S01E01.mkv", &host, Platform::Linux),
            "/storage/tv/Show/S01E01.mkv"
        );
    }

    #[test]
    fn prefix_must_end_on_a_component_boundary() {
        let mapper = PathMapper::new(vec![mapping("/data/tv", "/mnt/tv")]);
        let host = host_config("den", 0);
        assert_eq!(
            mapper.map("/data/tv2/Show.mkv", &host, Platform::Linux),
            "/data/tv2/Show.mkv"
        );
    }

    #[test]
    fn windows_hosts_get_backslashes() {
        let mapper = PathMapper::new(vec![mapping("/data/tv/", "D:/TV/")]);
        let host = host_config("den", 0);
        assert_eq!(
            mapper.map("/data/tv/Show/S01E01.mkv", &host, Platform::Windows),
            r"D:\TV\Show\S01E01.mkv"
        );
        assert_eq!(
            mapper.map_directory("/data/tv/Show", &host, Platform::Windows),
            r"D:\TV\Show\"
        );
    }

    #[test]
    fn url_targets_keep_forward_slashes() {
        let mapper = PathMapper::new(vec![mapping("/data/tv", "smb://nas/tv")]);
        let host = host_config("den", 0);
        assert_eq!(
            mapper.map_directory("/data/tv/Show", &host, Platform::Windows),
            "smb://nas/tv/Show/"
        );
    }

    #[test]
    fn unknown_platform_infers_style_from_target() {
        let mapper = PathMapper::new(vec![mapping("/data/tv", r"\\nas\tv")]);
        let host = host_config("den", 0);
        assert_eq!(
            mapper.map("/data/tv/Show/S01E01.mkv", &host, Platform::Unknown),
            r"\\nas\tv\Show\S01E01.mkv"
        );
        let posix = PathMapper::new(vec![mapping("/data/tv", "/mnt/tv")]);
        assert_eq!(
            posix.map_directory("/data/tv/Show", &host, Platform::Unknown),
            "/mnt/tv/Show/"
        );
    }
}
