//! Video pool: the configured URLs the front end can be sent to.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::storage::VideoConfig;

#[derive(Debug, Clone, Default)]
pub struct VideoPool {
    urls: Vec<String>,
}

impl VideoPool {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = urls
            .into_iter()
            .map(|u| u.as_ref().trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        Self { urls }
    }

    pub fn from_config(video: &VideoConfig) -> Self {
        Self::new(&video.urls)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Uniform pick; `None` when nothing is configured.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.urls.choose(rng).map(String::as_str)
    }

    pub fn pick_any(&self) -> Option<&str> {
        self.pick(&mut rand::thread_rng())
    }
}
