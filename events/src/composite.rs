use ee::{Image, ImageCollection, Reducer};

/// Tag selecting [`Composite::Mosaic`].
///
/// The tag is spelled `moisac`; `mosaic` is not recognized and falls
/// back to [`Composite::Mean`] like any other unknown tag.
pub const MOSAIC_TAG: &str = "moisac";

/// How the images of a date range are collapsed into one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composite {
    Sum,
    Median,
    Min,
    Max,
    Std,
    First,
    Last,
    Count,
    Mosaic,
    #[default]
    Mean,
}

impl Composite {
    /// Maps a reducer tag to a composite.
    ///
    /// Absent or unrecognized tags select [`Composite::Mean`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("sum") => Self::Sum,
            Some("median") => Self::Median,
            Some("min") => Self::Min,
            Some("max") => Self::Max,
            Some("std") => Self::Std,
            Some("first") => Self::First,
            Some("last") => Self::Last,
            Some("count") => Self::Count,
            Some(MOSAIC_TAG) => Self::Mosaic,
            _ => Self::Mean,
        }
    }

    /// Returns the tag that selects this composite.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
            Self::First => "first",
            Self::Last => "last",
            Self::Count => "count",
            Self::Mosaic => MOSAIC_TAG,
            Self::Mean => "mean",
        }
    }

    /// Collapses `collection` into one image.
    ///
    /// Every composite keeps the input band names except
    /// [`Composite::Std`], whose bands get a `_stdDev` suffix.
    pub fn apply(self, collection: &ImageCollection) -> Image {
        match self {
            Self::Sum => collection.sum(),
            Self::Median => collection.median(),
            Self::Min => collection.min(),
            Self::Max => collection.max(),
            Self::Std => collection.reduce(&Reducer::std_dev()),
            Self::First => collection.first(),
            Self::Last => collection.last(),
            Self::Count => collection.count(),
            Self::Mosaic => collection.mosaic(),
            Self::Mean => collection.mean(),
        }
    }
}
