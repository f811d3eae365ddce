//! Public-read URLs for the image buckets. Uploads and bucket setup belong
//! to the hosted backend.

use reqwest::Url;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    ProfileImages,
    EventImages,
}

impl Bucket {
    pub fn name(self) -> &'static str {
        match self {
            Bucket::ProfileImages => "profile-images",
            Bucket::EventImages => "event-images",
        }
    }
}

/// `{storage_base}/object/public/{bucket}/{path}`, or `None` for a blank path
/// or an unusable base.
pub fn public_url(storage_base: &str, bucket: Bucket, path: &str) -> Option<String> {
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    let mut url = Url::parse(storage_base.trim()).ok()?;
    {
        let mut segments = url.path_segments_mut().ok()?;
        segments
            .pop_if_empty()
            .extend(["object", "public", bucket.name()]);
        for part in path.split('/').filter(|p| !p.is_empty()) {
            segments.push(part);
        }
    }
    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_public_urls() {
        assert_eq!(
            public_url(
                "https://files.seekart.app/storage/v1/",
                Bucket::EventImages,
                "/a1/poster 1.png"
            )
            .as_deref(),
            Some("https://files.seekart.app/storage/v1/object/public/event-images/a1/poster%201.png")
        );
        assert_eq!(
            public_url("https://files.seekart.app", Bucket::ProfileImages, "u.jpg").as_deref(),
            Some("https://files.seekart.app/object/public/profile-images/u.jpg")
        );
    }

    #[test]
    fn blank_paths_and_bad_bases_give_nothing() {
        assert_eq!(public_url("https://files.seekart.app", Bucket::EventImages, "  "), None);
        assert_eq!(public_url("not a url", Bucket::EventImages, "x.png"), None);
    }
}
