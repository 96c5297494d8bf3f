//! Minimal session-description inspection
//!
//! Capability queries need an answer before capture completes; when a remote
//! description has been received its media lines are authoritative. Only
//! m-line presence matters here, full SDP handling belongs to the
//! negotiation engine.

/// Which media kinds a session description declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaSummary {
    /// An `m=audio` line is present
    pub audio: bool,
    /// An `m=video` line is present
    pub video: bool,
}

/// Scan a session description for media lines
pub fn summarize_sdp(sdp: &str) -> MediaSummary {
    let mut summary = MediaSummary::default();
    for line in sdp.lines() {
        let line = line.trim();
        if line.starts_with("m=audio") {
            summary.audio = true;
        } else if line.starts_with("m=video") {
            summary.video = true;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_media_lines() {
        let sdp = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=-\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=mid:0\r\n";
        let summary = summarize_sdp(sdp);
        assert!(summary.audio);
        assert!(!summary.video);
    }

    #[test]
    fn empty_description_declares_nothing() {
        assert_eq!(summarize_sdp(""), MediaSummary::default());
    }
}
