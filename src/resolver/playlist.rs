// M3U playlist rendering

use std::path::Path;

use super::errors::ResolveError;
use super::models::PlaylistRecord;

pub const PLAYLIST_HEADER: &str = "#EXTM3U";

/// Render records as an extended M3U playlist with VLC player options
pub fn render_playlist(records: &[PlaylistRecord]) -> String {
    let mut lines = vec![PLAYLIST_HEADER.to_string()];

    for record in records {
        lines.push(format!(
            "#EXTINF:-1 tvg-logo=\"{}\" group-title=\"{}\",{}",
            record.poster,
            record.group.to_uppercase(),
            record.name
        ));
        lines.push(format!("#EXTVLCOPT:http-origin={}", record.origin));
        lines.push(format!("#EXTVLCOPT:http-referrer={}", record.referer));
        lines.push(format!("#EXTVLCOPT:http-user-agent={}", record.user_agent));
        lines.push(record.manifest_url.clone());
    }

    lines.join("\n") + "\n"
}

pub async fn write_playlist(path: &Path, records: &[PlaylistRecord]) -> Result<(), ResolveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, render_playlist(records)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PlaylistRecord {
        PlaylistRecord {
            name: "Lakers vs Celtics".to_string(),
            poster: "https://img.test/p.png".to_string(),
            group: "Basketball".to_string(),
            manifest_url: "https://cdn.test/a.m3u8?t=1".to_string(),
            origin: "https://ppv.to".to_string(),
            referer: "https://ppv.to/".to_string(),
            user_agent: "UA/1.0".to_string(),
        }
    }

    #[test]
    fn test_render_single_record() {
        let expected = "#EXTM3U\n\
            #EXTINF:-1 tvg-logo=\"https://img.test/p.png\" group-title=\"BASKETBALL\",Lakers vs Celtics\n\
            #EXTVLCOPT:http-origin=https://ppv.to\n\
            #EXTVLCOPT:http-referrer=https://ppv.to/\n\
            #EXTVLCOPT:http-user-agent=UA/1.0\n\
            https://cdn.test/a.m3u8?t=1\n";
        assert_eq!(render_playlist(&[record()]), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_playlist(&[]), "#EXTM3U\n");
    }

    #[tokio::test]
    async fn test_write_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("ppv.m3u8");

        write_playlist(&path, &[record(), record()]).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 11);
        assert!(written.starts_with("#EXTM3U\n#EXTINF"));
    }
}
