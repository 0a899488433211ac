//! Static dimension tables for the star-schema data set.
//!
//! The engine stores every dimension as a dense integer row id, so all of the
//! interesting structure lives in the id assignment:
//!
//! - years 1992..=1998 map to ids 0..=6
//! - 5 regions, ids 0..=4
//! - 25 nations, 5 per region, grouped so a region's nations form the
//!   contiguous id range `[region*5, region*5+5)`
//! - 10 cities per nation, id `nation*10 + j`; the city label is the nation
//!   name padded or truncated to 9 characters with the digit `j` appended
//! - brands come 40 to a category, so category sequence `s` (1-based) owns
//!   brand ids `[40*(s-1), 40*s)`

use std::collections::HashMap;

use crate::BenchError;

pub const FIRST_YEAR: i32 = 1992;
pub const LAST_YEAR: i32 = 1998;

pub const NATIONS_PER_REGION: u64 = 5;
pub const CITIES_PER_NATION: u64 = 10;
pub const BRANDS_PER_CATEGORY: u64 = 40;
pub const CATEGORIES_PER_MFGR: u64 = 5;

const REGIONS: [&str; 5] = ["AMERICA", "AFRICA", "ASIA", "EUROPE", "MIDDLE EAST"];

// Region-major: the first five nations are AMERICA's, the next five AFRICA's,
// and so on in REGIONS order. The within-region order is the engine's
// ingestion order, so these indexes are the row ids the engine serves.
const NATIONS: [&str; 25] = [
    "CANADA",
    "ARGENTINA",
    "BRAZIL",
    "UNITED STATES",
    "PERU",
    "ETHIOPIA",
    "ALGERIA",
    "KENYA",
    "MOZAMBIQUE",
    "MOROCCO",
    "INDIA",
    "INDONESIA",
    "CHINA",
    "VIETNAM",
    "JAPAN",
    "ROMANIA",
    "RUSSIA",
    "FRANCE",
    "UNITED KINGDOM",
    "GERMANY",
    "SAUDI ARABIA",
    "JORDAN",
    "IRAN",
    "IRAQ",
    "EGYPT",
];

/// Lookup tables in both directions for every dimension the query families
/// touch. Construction is cheap and infallible; lookups return
/// [`BenchError::NotFound`] for labels or ids outside the data set.
pub struct Dimensions {
    regions: HashMap<&'static str, u64>,
    nations: HashMap<&'static str, u64>,
    cities: HashMap<String, u64>,
    city_labels: Vec<String>,
}

impl Dimensions {
    pub fn new() -> Dimensions {
        let regions = REGIONS.iter().enumerate().map(|(i, &r)| (r, i as u64)).collect();
        let nations: HashMap<&'static str, u64> =
            NATIONS.iter().enumerate().map(|(i, &n)| (n, i as u64)).collect();

        let mut cities = HashMap::new();
        let mut city_labels = Vec::with_capacity(NATIONS.len() * CITIES_PER_NATION as usize);
        for (nation_id, nation) in NATIONS.iter().enumerate() {
            for j in 0..CITIES_PER_NATION {
                let label = city_label(nation, j);
                cities.insert(label.clone(), nation_id as u64 * CITIES_PER_NATION + j);
                city_labels.push(label);
            }
        }

        Dimensions { regions, nations, cities, city_labels }
    }

    /// Year value to row id. Only 1992..=1998 exist in the data set.
    pub fn year_id(&self, year: i32) -> Result<u64, BenchError> {
        if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
            return Err(BenchError::NotFound(format!("year: {}", year)));
        }
        Ok((year - FIRST_YEAR) as u64)
    }

    /// All years in the data set, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        FIRST_YEAR..=LAST_YEAR
    }

    pub fn region_id(&self, name: &str) -> Result<u64, BenchError> {
        self.regions
            .get(name)
            .copied()
            .ok_or_else(|| BenchError::NotFound(format!("region: {}", name)))
    }

    pub fn nation_id(&self, name: &str) -> Result<u64, BenchError> {
        self.nations
            .get(name)
            .copied()
            .ok_or_else(|| BenchError::NotFound(format!("nation: {}", name)))
    }

    pub fn nation_label(&self, id: u64) -> Result<&'static str, BenchError> {
        NATIONS
            .get(id as usize)
            .copied()
            .ok_or_else(|| BenchError::NotFound(format!("nation id: {}", id)))
    }

    pub fn city_id(&self, label: &str) -> Result<u64, BenchError> {
        self.cities
            .get(label)
            .copied()
            .ok_or_else(|| BenchError::NotFound(format!("city: {}", label)))
    }

    pub fn city_label(&self, id: u64) -> Result<&str, BenchError> {
        self.city_labels
            .get(id as usize)
            .map(|s| s.as_str())
            .ok_or_else(|| BenchError::NotFound(format!("city id: {}", id)))
    }

    /// Contiguous nation id range belonging to a region.
    pub fn nations_of_region(&self, region_id: u64) -> std::ops::Range<u64> {
        let lo = region_id * NATIONS_PER_REGION;
        lo..lo + NATIONS_PER_REGION
    }

    /// Contiguous city id range belonging to a nation.
    pub fn cities_of_nation(&self, nation_id: u64) -> std::ops::Range<u64> {
        let lo = nation_id * CITIES_PER_NATION;
        lo..lo + CITIES_PER_NATION
    }

    /// Contiguous brand id range belonging to a category, identified by the
    /// category's 1-based sequence number. Category sequence 1 is MFGR#11,
    /// sequence 6 is MFGR#21, and so on, 5 categories per manufacturer.
    pub fn brands_of_category(&self, category_seq: u64) -> std::ops::Range<u64> {
        let lo = (category_seq - 1) * BRANDS_PER_CATEGORY;
        lo..lo + BRANDS_PER_CATEGORY
    }

    /// Human-readable brand label for a brand id, e.g. id 45 (6th brand of
    /// category sequence 2) is "MFGR#126".
    pub fn brand_label(&self, brand_id: u64) -> String {
        let seq = brand_id / BRANDS_PER_CATEGORY;
        let brandnum = brand_id % BRANDS_PER_CATEGORY;
        let mfgr = seq / CATEGORIES_PER_MFGR + 1;
        let cat = seq % CATEGORIES_PER_MFGR + 1;
        format!("MFGR#{}{}{}", mfgr, cat, brandnum + 1)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Dimensions::new()
    }
}

fn city_label(nation: &str, j: u64) -> String {
    let mut s = format!("{:<9}", nation);
    s.truncate(9);
    s.push_str(&j.to_string());
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_ids() {
        let d = Dimensions::new();
        assert_eq!(d.year_id(1992).unwrap(), 0);
        assert_eq!(d.year_id(1998).unwrap(), 6);
        assert!(d.year_id(1991).is_err());
        assert!(d.year_id(1999).is_err());
    }

    #[test]
    fn nation_and_region_ids() {
        let d = Dimensions::new();
        assert_eq!(d.region_id("AMERICA").unwrap(), 0);
        assert_eq!(d.region_id("ASIA").unwrap(), 2);
        assert_eq!(d.nation_id("UNITED STATES").unwrap(), 3);
        assert_eq!(d.nation_id("INDIA").unwrap(), 10);
        assert_eq!(d.nation_id("CHINA").unwrap(), 12);
        // every region's nations are a contiguous block of five
        let asia = d.nations_of_region(d.region_id("ASIA").unwrap());
        assert_eq!(asia, 10..15);
        for id in asia {
            assert!(d.nation_label(id).is_ok());
        }
        assert!(d.region_id("ATLANTIS").is_err());
    }

    #[test]
    fn nation_ids_match_engine_ingestion() {
        // these row ids are baked into the stored data set; any reordering
        // of the tables silently queries the wrong rows
        let d = Dimensions::new();
        assert_eq!(d.nation_id("INDIA").unwrap(), 10);
        assert_eq!(d.nation_id("CHINA").unwrap(), 12);
        assert_eq!(d.nation_id("FRANCE").unwrap(), 17);
        assert_eq!(d.nation_id("UNITED KINGDOM").unwrap(), 18);
        assert_eq!(d.nation_id("SAUDI ARABIA").unwrap(), 20);
        assert_eq!(d.nation_id("EGYPT").unwrap(), 24);
        assert_eq!(d.city_id("UNITED KI1").unwrap(), 181);
        assert_eq!(d.city_id("UNITED KI5").unwrap(), 185);
        assert_eq!(d.nation_label(10).unwrap(), "INDIA");
    }

    #[test]
    fn city_labels_pad_and_truncate() {
        let d = Dimensions::new();
        // short nation padded with spaces to 9 chars
        assert_eq!(d.city_label(d.nation_id("PERU").unwrap() * 10).unwrap(), "PERU     0");
        // long nation truncated to 9 chars
        let uk0 = d.nation_id("UNITED KINGDOM").unwrap() * 10;
        assert_eq!(d.city_label(uk0 + 1).unwrap(), "UNITED KI1");
        assert_eq!(d.city_id("UNITED KI1").unwrap(), uk0 + 1);
        assert_eq!(d.cities_of_nation(d.nation_id("UNITED STATES").unwrap()), 30..40);
    }

    #[test]
    fn brand_ranges_and_labels() {
        let d = Dimensions::new();
        assert_eq!(d.brands_of_category(1), 0..40);
        assert_eq!(d.brands_of_category(2), 40..80);
        assert_eq!(d.brand_label(40), "MFGR#121");
        assert_eq!(d.brand_label(79), "MFGR#1240");
        // sequence 6 rolls over to the second manufacturer
        assert_eq!(d.brand_label(200), "MFGR#211");
    }
}
