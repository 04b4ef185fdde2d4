use crate::{cfg::Rectangle, prelude::GridOpts};

/// [AreaFilter] decides which grid cells are processed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaFilter {
    inclusion: Vec<Rectangle>,
    exclusion: Vec<Rectangle>,
}

impl AreaFilter {
    pub fn new(inclusion: Vec<Rectangle>, exclusion: Vec<Rectangle>) -> Self {
        Self {
            inclusion,
            exclusion,
        }
    }

    pub fn from_opts(opts: &GridOpts) -> Self {
        Self::new(opts.inclusion.clone(), opts.exclusion.clone())
    }

    /// True if (lat, lon) should be processed: within one of the inclusion
    /// areas (when defined) and outside all exclusion areas.
    pub fn accepts(&self, lat: f64, lon: f64) -> bool {
        let included =
            self.inclusion.is_empty() || self.inclusion.iter().any(|r| r.contains(lat, lon));
        included && !self.exclusion.iter().any(|r| r.contains(lat, lon))
    }
}

#[cfg(test)]
mod test {
    use super::AreaFilter;
    use crate::cfg::Rectangle;

    #[test]
    fn no_area() {
        let filter = AreaFilter::default();
        assert!(filter.accepts(0.0, 0.0));
        assert!(filter.accepts(-90.0, 180.0));
    }

    #[test]
    fn inclusion_and_exclusion() {
        let europe = Rectangle::new(-10.0, 30.0, 35.0, 70.0).unwrap();
        let alps = Rectangle::new(5.0, 15.0, 44.0, 48.0).unwrap();
        let filter = AreaFilter::new(vec![europe], vec![alps]);

        assert!(filter.accepts(40.0, 0.0));
        assert!(!filter.accepts(20.0, 0.0));
        // exclusion prevails
        assert!(!filter.accepts(45.0, 10.0));
        assert!(filter.accepts(43.9, 10.0));
    }

    #[test]
    fn exclusion_only() {
        let alps = Rectangle::new(5.0, 15.0, 44.0, 48.0).unwrap();
        let filter = AreaFilter::new(vec![], vec![alps]);
        assert!(filter.accepts(-45.0, 100.0));
        assert!(!filter.accepts(46.0, 6.0));
    }
}
