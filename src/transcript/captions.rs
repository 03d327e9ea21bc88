//! YouTube caption tracks: listing from yt-dlp metadata, language selection,
//! and parsing of the `json3` caption format.

use super::TranscriptSegment;
use crate::error::{KapittelError, Result};
use serde::Deserialize;

/// Whether a caption track was uploaded by the creator or generated by YouTube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Manual,
    Automatic,
}

/// One downloadable rendition of a caption track.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionFormat {
    pub ext: String,
    pub url: String,
}

/// A caption track in a single language.
#[derive(Debug, Clone)]
pub struct CaptionTrack {
    pub language: String,
    pub kind: TrackKind,
    pub formats: Vec<CaptionFormat>,
}

impl CaptionTrack {
    /// URL of the `json3` rendition, if the track offers one.
    pub fn json3_url(&self) -> Option<&str> {
        self.formats
            .iter()
            .find(|f| f.ext == "json3")
            .map(|f| f.url.as_str())
    }

    fn is_english(&self) -> bool {
        let lang = self.language.to_ascii_lowercase();
        lang == "en" || lang.starts_with("en-")
    }
}

/// Collect caption tracks from yt-dlp `--dump-json` output.
///
/// Manual subtitles come first, then automatic captions, each in the order
/// yt-dlp reports them. Machine translations (caption URLs carrying `tlang`)
/// are not transcripts of the video and are skipped; `<lang>-orig` is listed
/// as `<lang>`.
pub fn tracks_from_metadata(metadata: &serde_json::Value) -> Vec<CaptionTrack> {
    let mut tracks = Vec::new();

    for (key, kind) in [
        ("subtitles", TrackKind::Manual),
        ("automatic_captions", TrackKind::Automatic),
    ] {
        let Some(map) = metadata[key].as_object() else {
            continue;
        };

        for (language, formats) in map {
            if language == "live_chat" {
                continue;
            }
            let formats: Vec<CaptionFormat> =
                serde_json::from_value(formats.clone()).unwrap_or_default();
            if formats.is_empty() || formats.iter().any(is_translation) {
                continue;
            }

            let language = language.strip_suffix("-orig").unwrap_or(language);
            if tracks
                .iter()
                .any(|t: &CaptionTrack| t.kind == kind && t.language == language)
            {
                continue;
            }
            tracks.push(CaptionTrack {
                language: language.to_string(),
                kind,
                formats,
            });
        }
    }

    tracks
}

fn is_translation(format: &CaptionFormat) -> bool {
    url::Url::parse(&format.url)
        .map(|u| u.query_pairs().any(|(key, _)| key == "tlang"))
        .unwrap_or(false)
}

/// Choose the caption track to fetch.
///
/// With a hint, only an exact (case-insensitive) language match is accepted.
/// Without one, the preferred language wins (exact code, then a regional
/// variant such as `en-US`); otherwise the first track is used.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    hint: Option<&str>,
    preferred: &str,
) -> Result<&'a CaptionTrack> {
    if tracks.is_empty() {
        return Err(KapittelError::TranscriptNotFound(
            "no transcripts are available for this video".to_string(),
        ));
    }

    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        return tracks
            .iter()
            .find(|t| t.language.eq_ignore_ascii_case(hint))
            .ok_or_else(|| {
                let available: Vec<&str> = tracks.iter().map(|t| t.language.as_str()).collect();
                KapittelError::TranscriptNotFound(format!(
                    "no transcript in language '{}' (available: {})",
                    hint,
                    available.join(", ")
                ))
            });
    }

    let preferred = preferred.to_ascii_lowercase();
    let exact = tracks
        .iter()
        .find(|t| t.language.eq_ignore_ascii_case(&preferred));
    let variant = || {
        tracks.iter().find(|t| {
            t.language
                .to_ascii_lowercase()
                .starts_with(&format!("{}-", preferred))
        })
    };

    // The English rule applies even when `preferred` is configured otherwise.
    let english = || tracks.iter().find(|t| t.is_english());

    Ok(exact
        .or_else(variant)
        .or_else(english)
        .unwrap_or(&tracks[0]))
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: Option<f64>,
    #[serde(default)]
    d_duration_ms: Option<f64>,
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a `json3` caption document into transcript segments.
///
/// Events without text (window definitions, line breaks) are skipped.
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let doc: Json3 = serde_json::from_str(body)?;

    let segments = doc
        .events
        .into_iter()
        .filter_map(|event| {
            let segs = event.segs?;
            let text = segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }

            let start = event.t_start_ms.unwrap_or(0.0).max(0.0) / 1000.0;
            let duration = event.d_duration_ms.unwrap_or(0.0).max(0.0) / 1000.0;
            Some(TranscriptSegment::new(start, duration, text))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track(language: &str, kind: TrackKind) -> CaptionTrack {
        CaptionTrack {
            language: language.to_string(),
            kind,
            formats: vec![CaptionFormat {
                ext: "json3".to_string(),
                url: format!("https://example.test/{language}.json3"),
            }],
        }
    }

    #[test]
    fn test_tracks_from_metadata_orders_manual_first() {
        let metadata = json!({
            "id": "abc123",
            "subtitles": {
                "de": [{"ext": "vtt", "url": "https://x/de.vtt"}, {"ext": "json3", "url": "https://x/de.json3"}],
                "live_chat": [{"ext": "json", "url": "https://x/chat"}]
            },
            "automatic_captions": {
                "fr": [{"ext": "json3", "url": "https://x/fr.json3"}],
                "en": [{"ext": "json3", "url": "https://x/en.json3"}]
            }
        });

        let tracks = tracks_from_metadata(&metadata);
        let langs: Vec<&str> = tracks.iter().map(|t| t.language.as_str()).collect();
        assert_eq!(langs, vec!["de", "fr", "en"]);
        assert_eq!(tracks[0].kind, TrackKind::Manual);
        assert_eq!(tracks[0].json3_url(), Some("https://x/de.json3"));
        assert_eq!(tracks[2].kind, TrackKind::Automatic);
    }

    #[test]
    fn test_tracks_from_metadata_skips_translations() {
        let metadata = json!({
            "subtitles": {
                "es": [{"ext": "json3", "url": "https://x/timedtext?lang=es&fmt=json3"}]
            },
            "automatic_captions": {
                "es-orig": [{"ext": "json3", "url": "https://x/timedtext?lang=es&kind=asr&fmt=json3"}],
                "af": [{"ext": "json3", "url": "https://x/timedtext?lang=es&tlang=af&fmt=json3"}],
                "en": [{"ext": "json3", "url": "https://x/timedtext?lang=es&tlang=en&fmt=json3"}]
            }
        });

        let tracks = tracks_from_metadata(&metadata);
        let listed: Vec<(&str, TrackKind)> =
            tracks.iter().map(|t| (t.language.as_str(), t.kind)).collect();
        assert_eq!(
            listed,
            vec![("es", TrackKind::Manual), ("es", TrackKind::Automatic)]
        );

        let selected = select_track(&tracks, None, "en").unwrap();
        assert_eq!(selected.language, "es");
        assert_eq!(selected.kind, TrackKind::Manual);
    }

    #[test]
    fn test_tracks_from_metadata_without_captions() {
        let metadata = json!({"id": "abc123", "subtitles": {}, "automatic_captions": null});
        assert!(tracks_from_metadata(&metadata).is_empty());
    }

    #[test]
    fn test_select_prefers_english() {
        let tracks = vec![
            track("es", TrackKind::Manual),
            track("en", TrackKind::Automatic),
        ];
        let selected = select_track(&tracks, None, "en").unwrap();
        assert_eq!(selected.language, "en");
    }

    #[test]
    fn test_select_accepts_english_variant() {
        let tracks = vec![
            track("es", TrackKind::Manual),
            track("en-GB", TrackKind::Manual),
        ];
        let selected = select_track(&tracks, None, "en").unwrap();
        assert_eq!(selected.language, "en-GB");
    }

    #[test]
    fn test_select_falls_back_to_first() {
        let tracks = vec![
            track("ja", TrackKind::Manual),
            track("ko", TrackKind::Automatic),
        ];
        let selected = select_track(&tracks, None, "en").unwrap();
        assert_eq!(selected.language, "ja");
    }

    #[test]
    fn test_select_with_hint() {
        let tracks = vec![
            track("en", TrackKind::Manual),
            track("pt-BR", TrackKind::Manual),
        ];
        let selected = select_track(&tracks, Some("pt-br"), "en").unwrap();
        assert_eq!(selected.language, "pt-BR");
    }

    #[test]
    fn test_select_missing_hint_is_not_found() {
        let tracks = vec![track("en", TrackKind::Manual)];
        let err = select_track(&tracks, Some("de"), "en").unwrap_err();
        assert!(matches!(err, KapittelError::TranscriptNotFound(_)));
        assert!(err.to_string().contains("available: en"));
    }

    #[test]
    fn test_select_no_tracks_is_not_found() {
        assert!(matches!(
            select_track(&[], None, "en"),
            Err(KapittelError::TranscriptNotFound(_))
        ));
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 30000, "id": 1, "wpWinPosId": 1},
                {"tStartMs": 120, "dDurationMs": 4000, "segs": [{"utf8": "Hello"}, {"utf8": " world\n"}]},
                {"tStartMs": 4120, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 4200, "dDurationMs": 3500, "segs": [{"utf8": "second  line"}]}
            ]
        }"#;

        let segments = parse_json3(body).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], TranscriptSegment::new(0.12, 4.0, "Hello world"));
        assert_eq!(segments[1].text, "second line");
        assert_eq!(segments[1].start_seconds, 4.2);
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(parse_json3("<html>").is_err());
    }
}
