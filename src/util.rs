use crate::config::Config;
use enum_map::Enum;
use ratatui::layout::{Flex, Layout, Rect, Size};
use std::path::PathBuf;

/// State shared by every screen of the application
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Globals {
    pub(crate) config: Config,

    /// The longest snake achieved so far, as read from (and later written
    /// back to) the best-length file
    pub(crate) best_length: u32,

    /// Seed for the next round's random generator; `None` means "seed from
    /// the operating system"
    pub(crate) seed: Option<u64>,
}

pub(crate) trait EnumExt: Enum + Sized {
    fn iter() -> impl Iterator<Item = Self> {
        (0..Self::LENGTH).map(Self::from_usize)
    }

    fn min() -> Self {
        Self::from_usize(0)
    }

    fn max() -> Self {
        Self::from_usize(Self::LENGTH - 1)
    }

    fn next(self) -> Option<Self> {
        let i = self.into_usize() + 1;
        (i < Self::LENGTH).then(|| Self::from_usize(i))
    }

    fn prev(self) -> Option<Self> {
        self.into_usize().checked_sub(1).map(Self::from_usize)
    }
}

impl<T: Enum> EnumExt for T {}

/// Return a rectangle of size `size` centered in `area`, clamped to `area`
pub(crate) fn center_rect(area: Rect, size: Size) -> Rect {
    let [r] = Layout::horizontal([size.width])
        .flex(Flex::Center)
        .areas(area);
    let [r] = Layout::vertical([size.height])
        .flex(Flex::Center)
        .areas(r);
    r
}

/// Directory in which the program stores its data files
pub(crate) fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("stonesnake"))
}

pub(crate) fn best_length_file_path() -> Option<PathBuf> {
    data_dir().map(|p| p.join("best.json"))
}

pub(crate) fn log_file_path() -> Option<PathBuf> {
    data_dir().map(|p| p.join("stonesnake.log"))
}
