//! The catalog of star-schema benchmark query families.
//!
//! Flat families ([`flat`]) expand to a [`QuerySet`] and run through the
//! batching dispatcher; grouped families ([`grouped`]) expand to labeled
//! [`GroupRow`]s plus the family's ORDER BY. Family names follow the
//! standard star-schema numbering (1.1 .. 4.3); the `b` variants replace
//! range predicates with unions of single-value rows for engines without
//! range support, and the `c` / `r` variants exercise BETWEEN (`><`) and
//! region-optimized intersection forms.

use crate::dims::Dimensions;
use crate::grouped::{GroupRow, OrderBy};
use crate::queryset::{arange, QuerySet};
use crate::BenchError;

pub const FLAT_FAMILIES: &[&str] = &[
    "1.1", "1.2", "1.3", "1.1b", "1.2b", "1.3b", "1.1c", "1.2c", "1.3c", "2.1", "2.2", "2.3",
    "3.1", "3.1r", "3.2", "3.2r", "3.3", "3.4", "4.1", "4.2", "4.3", "4.3r", "test",
];

pub const GROUPED_FAMILIES: &[&str] =
    &["2.1", "2.2", "2.3", "3.1", "3.2", "3.3", "3.4", "4.1", "4.2", "4.3"];

const Q1_1: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID=%d),
        Range(frame="lo_discount", lo_discount >= 1),
        Range(frame="lo_discount", lo_discount <= 3),
        Range(frame="lo_quantity", lo_quantity < 25)
    ),
frame="lo_revenue_computed", field="lo_revenue_computed")"#;

const Q1_2: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_month", rowID=0),
        Bitmap(frame="lo_year", rowID=%d),
        Range(frame="lo_discount", lo_discount >= 4),
        Range(frame="lo_discount", lo_discount <= 6),
        Range(frame="lo_quantity", lo_quantity >= 26),
        Range(frame="lo_quantity", lo_quantity <= 35)
    ),
frame="lo_revenue_computed", field="lo_revenue_computed")"#;

const Q1_3: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_weeknum", rowID=6),
        Bitmap(frame="lo_year", rowID=%d),
        Range(frame="lo_discount", lo_discount >= 5),
        Range(frame="lo_discount", lo_discount <= 7),
        Range(frame="lo_quantity", lo_quantity >= 26),
        Range(frame="lo_quantity", lo_quantity <= 35)
    ),
frame="lo_revenue_computed", field="lo_revenue_computed")"#;

const Q1_1C: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID=%d),
        Range(frame="lo_discount", lo_discount >< [1,3]),
        Range(frame="lo_quantity", lo_quantity < 25)
    ),
frame="lo_revenue_computed", field="lo_revenue_computed")"#;

const Q1_2C: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_month", rowID=0),
        Bitmap(frame="lo_year", rowID=%d),
        Range(frame="lo_discount", lo_discount >< [4,6]),
        Range(frame="lo_quantity", lo_quantity >< [26,35])
    ),
frame="lo_revenue_computed", field="lo_revenue_computed")"#;

const Q1_3C: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_weeknum", rowID=6),
        Bitmap(frame="lo_year", rowID=%d),
        Range(frame="lo_discount", lo_discount >< [5,7]),
        Range(frame="lo_quantity", lo_quantity >< [26,35])
    ),
frame="lo_revenue_computed", field="lo_revenue_computed")"#;

const Q2: &str = r#"Sum(
    Intersect(
        Bitmap(frame="p_brand1", rowID=%d),
        Bitmap(frame="lo_year", rowID=%d),
        Bitmap(frame="s_region", rowID=%d)
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q2_3: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID=%d),
        Bitmap(frame="p_brand1", rowID=260),
        Bitmap(frame="s_region", rowID=3)
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q3_NATION: &str = r#"Sum(
    Intersect(
        Bitmap(frame="c_nation", rowID=%d),
        Bitmap(frame="s_nation", rowID=%d),
        Bitmap(frame="lo_year", rowID=%d)
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q3_NATION_R: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID=%d),
        IntersectReg(
            Bitmap(frame="c_nation", rowID=%d),
            Bitmap(frame="s_nation", rowID=%d)
        )
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q3_CITY: &str = r#"Sum(
    Intersect(
        Bitmap(frame="c_city", rowID=%d),
        Bitmap(frame="s_city", rowID=%d),
        Bitmap(frame="lo_year", rowID=%d)
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q3_CITY_R: &str = r#"Sum(
    Intersect(
        Bitmap(frame="c_city", rowID=%d),
        IntersectReg(
            Bitmap(frame="s_city", rowID=%d),
            Bitmap(frame="lo_year", rowID=%d)
        )
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q3_4: &str = r#"Sum(
    Intersect(
        Bitmap(frame="c_city", rowID=%d),
        Bitmap(frame="s_city", rowID=%d),
        Bitmap(frame="lo_month", rowID=11),
        Bitmap(frame="lo_year", rowID=5)
    ),
    frame="lo_revenue", field="lo_revenue")"#;

const Q4_1: &str = r#"Sum(
    Intersect(
        Bitmap(frame="c_nation", rowID=%d),
        Bitmap(frame="lo_year", rowID=%d),
        Bitmap(frame="s_region", rowID=0),
        Union(
            Bitmap(frame="p_mfgr", rowID=1),
            Bitmap(frame="p_mfgr", rowID=2)
        )
    ),
frame="lo_profit", field="lo_profit")"#;

const Q4_2: &str = r#"Sum(
    Intersect(
        Bitmap(frame="p_category", rowID=%d),
        Bitmap(frame="s_nation", rowID=%d),
        Bitmap(frame="lo_year", rowID=%d),
        Bitmap(frame="c_region", rowID=0)
    ),
frame="lo_profit", field="lo_profit")"#;

const Q4_3: &str = r#"Sum(
    Intersect(
        Bitmap(frame="p_brand1", rowID=%d),
        Bitmap(frame="s_city", rowID=%d),
        Bitmap(frame="lo_year", rowID=%d),
        Bitmap(frame="c_region", rowID=0)
    ),
frame="lo_profit", field="lo_profit")"#;

const Q4_3R: &str = r#"Sum(
    Intersect(
        Bitmap(frame="p_brand1", rowID=%d),
        IntersectReg(
            Bitmap(frame="lo_year", rowID=%d),
            Bitmap(frame="s_city", rowID=%d),
            Bitmap(frame="c_region", rowID=0)
        )
    ),
frame="lo_profit", field="lo_profit")"#;

const TEST_FMT: &str = r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID=%d),
        Bitmap(frame="p_brand1", rowID=%d),
        Bitmap(frame="s_region", rowID=%d)
    ),
    frame="lo_revenue", field="lo_revenue")"#;

fn year_ids(dims: &Dimensions, years: &[i32]) -> Result<Vec<i64>, BenchError> {
    years.iter().map(|&y| dims.year_id(y).map(|id| id as i64)).collect()
}

/// Build the flat query set for a family name. Argument lists are ordered
/// so the first dimension cycles fastest, matching the historical flat-log
/// line order.
pub fn flat(name: &str, dims: &Dimensions) -> Result<QuerySet, BenchError> {
    let all_years: Vec<i32> = dims.years().collect();
    match name {
        "1.1" => QuerySet::ints(name, Q1_1, vec![year_ids(dims, &[1993])?]),
        "1.2" => QuerySet::ints(name, Q1_2, vec![year_ids(dims, &[1994])?]),
        "1.3" => QuerySet::ints(name, Q1_3, vec![year_ids(dims, &[1994])?]),
        "1.1b" => QuerySet::ints(name, &q1b(1, &discounts(1, 3), &quantities_below(25)), vec![
            year_ids(dims, &[1993])?,
        ]),
        "1.2b" => QuerySet::ints(name, &q1b(2, &discounts(4, 6), &quantities(26, 36)), vec![
            year_ids(dims, &[1994])?,
        ]),
        "1.3b" => QuerySet::ints(name, &q1b(3, &discounts(5, 7), &quantities(26, 36)), vec![
            year_ids(dims, &[1994])?,
        ]),
        "1.1c" => QuerySet::ints(name, Q1_1C, vec![year_ids(dims, &[1993])?]),
        "1.2c" => QuerySet::ints(name, Q1_2C, vec![year_ids(dims, &[1994])?]),
        "1.3c" => QuerySet::ints(name, Q1_3C, vec![year_ids(dims, &[1994])?]),
        "2.1" => {
            // brands of the second category sequence, MFGR#12; the fixed
            // supplier region rides along as a singleton dimension
            let brands: Vec<i64> = dims.brands_of_category(2).map(|b| b as i64).collect();
            QuerySet::ints(name, Q2, vec![
                brands,
                year_ids(dims, &all_years)?,
                vec![dims.region_id("AMERICA")? as i64],
            ])
        }
        "2.2" => {
            // MFGR#2221 .. MFGR#2228: category sequence 7, brand numbers 20..27
            let lo = dims.brands_of_category(7).start as i64;
            let brands = arange(lo + 20, lo + 28, 1);
            QuerySet::ints(name, Q2, vec![
                brands,
                year_ids(dims, &all_years)?,
                vec![dims.region_id("ASIA")? as i64],
            ])
        }
        "2.3" => QuerySet::ints(name, Q2_3, vec![year_ids(dims, &all_years)?]),
        "3.1" | "3.1r" => {
            let nations: Vec<i64> =
                dims.nations_of_region(dims.region_id("ASIA")?).map(|n| n as i64).collect();
            let years = year_ids(dims, &all_years[..6])?;
            if name == "3.1" {
                QuerySet::ints(name, Q3_NATION, vec![nations.clone(), nations, years])
            } else {
                QuerySet::ints(name, Q3_NATION_R, vec![years, nations.clone(), nations])
            }
        }
        "3.2" | "3.2r" => {
            let cities: Vec<i64> = dims
                .cities_of_nation(dims.nation_id("UNITED STATES")?)
                .map(|c| c as i64)
                .collect();
            let years = year_ids(dims, &all_years[..6])?;
            let fmt = if name == "3.2" { Q3_CITY } else { Q3_CITY_R };
            QuerySet::ints(name, fmt, vec![cities.clone(), cities, years])
        }
        "3.3" => {
            let cities = vec![
                dims.city_id("UNITED KI1")? as i64,
                dims.city_id("UNITED KI5")? as i64,
            ];
            QuerySet::ints(name, Q3_CITY, vec![
                cities.clone(),
                cities,
                year_ids(dims, &all_years[..6])?,
            ])
        }
        "3.4" => {
            let cities = vec![
                dims.city_id("UNITED KI1")? as i64,
                dims.city_id("UNITED KI5")? as i64,
            ];
            QuerySet::ints(name, Q3_4, vec![cities.clone(), cities])
        }
        "4.1" => {
            let nations: Vec<i64> =
                dims.nations_of_region(dims.region_id("AMERICA")?).map(|n| n as i64).collect();
            QuerySet::ints(name, Q4_1, vec![nations, year_ids(dims, &all_years)?])
        }
        "4.2" => {
            let nations: Vec<i64> =
                dims.nations_of_region(dims.region_id("AMERICA")?).map(|n| n as i64).collect();
            QuerySet::ints(name, Q4_2, vec![
                arange(0, 10, 1),
                nations,
                year_ids(dims, &[1997, 1998])?,
            ])
        }
        "4.3" | "4.3r" => {
            let cities: Vec<i64> = dims
                .cities_of_nation(dims.nation_id("UNITED STATES")?)
                .map(|c| c as i64)
                .collect();
            let brands: Vec<i64> = dims.brands_of_category(4).map(|b| b as i64).collect();
            let years = year_ids(dims, &[1997, 1998])?;
            if name == "4.3" {
                QuerySet::ints(name, Q4_3, vec![brands, cities, years])
            } else {
                QuerySet::ints(name, Q4_3R, vec![brands, years, cities])
            }
        }
        "test" => QuerySet::ints(name, TEST_FMT, vec![
            year_ids(dims, &all_years[..6])?,
            vec![0, 1, 2, 3],
            vec![0, 1, 2],
        ]),
        _ => Err(BenchError::UnknownFamily(name.to_string())),
    }
}

fn discounts(lo: u64, hi: u64) -> Vec<u64> {
    (lo..=hi).collect()
}

fn quantities(lo: u64, hi: u64) -> Vec<u64> {
    (lo..hi).collect()
}

fn quantities_below(hi: u64) -> Vec<u64> {
    (1..hi).collect()
}

/// The `b` variants expand each range predicate into a Union over the
/// individual single-value rows, for engines without range support.
fn q1b(which: u8, discount_rows: &[u64], quantity_rows: &[u64]) -> String {
    let union = |frame: &str, rows: &[u64]| {
        let body = rows
            .iter()
            .map(|r| format!("            Bitmap(frame={}, rowID={})", frame, r))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("        Union(\n{}\n        )", body)
    };
    let extra = match which {
        2 => "        Bitmap(frame=\"lo_month\", rowID=0),\n",
        3 => "        Bitmap(frame=\"lo_weeknum\", rowID=6),\n",
        _ => "",
    };
    format!(
        "Sum(\n    Intersect(\n{}        Bitmap(frame=\"lo_year\", rowID=%d),\n{},\n{}\n    ),\nframe=\"lo_revenue_computed\", field=\"lo_revenue_computed\")",
        extra,
        union("lo_discount_b", discount_rows),
        union("lo_quantity_b", quantity_rows)
    )
}

fn q2_cell(year_id: u64, brand_id: u64, region: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="p_brand1", rowID={}),
        Bitmap(frame="s_region", rowID={})
    ),
    frame="lo_revenue", field="lo_revenue")"#,
        year_id, brand_id, region
    )
}

fn q3_nation_cell(year_id: u64, c_nation: u64, s_nation: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="c_nation", rowID={}),
        Bitmap(frame="s_nation", rowID={})
    ),
    frame="lo_revenue", field="lo_revenue")"#,
        year_id, c_nation, s_nation
    )
}

fn q3_city_cell(year_id: u64, c_city: u64, s_city: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="c_city", rowID={}),
        Bitmap(frame="s_city", rowID={})
    ),
    frame="lo_revenue", field="lo_revenue")"#,
        year_id, c_city, s_city
    )
}

fn q3_city_month_cell(year_id: u64, month_id: u64, c_city: u64, s_city: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="lo_month", rowID={}),
        Bitmap(frame="c_city", rowID={}),
        Bitmap(frame="s_city", rowID={})
    ),
    frame="lo_revenue", field="lo_revenue")"#,
        year_id, month_id, c_city, s_city
    )
}

fn q4_1_cell(year_id: u64, c_nation: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="c_nation", rowID={}),
        Bitmap(frame="s_region", rowID=0),
        Union(
            Bitmap(frame="p_mfgr", rowID=1),
            Bitmap(frame="p_mfgr", rowID=2)
        )
    ),
frame="lo_profit", field="lo_profit")"#,
        year_id, c_nation
    )
}

fn q4_2_cell(year_id: u64, s_nation: u64, category: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="s_nation", rowID={}),
        Bitmap(frame="c_region", rowID=0),
        Bitmap(frame="p_category", rowID={})
    ),
frame="lo_profit", field="lo_profit")"#,
        year_id, s_nation, category
    )
}

fn q4_3_cell(year_id: u64, s_city: u64, brand_id: u64) -> String {
    format!(
        r#"Sum(
    Intersect(
        Bitmap(frame="lo_year", rowID={}),
        Bitmap(frame="s_city", rowID={}),
        Bitmap(frame="c_region", rowID=0),
        Bitmap(frame="p_brand1", rowID={})
    ),
frame="lo_profit", field="lo_profit")"#,
        year_id, s_city, brand_id
    )
}

/// Enumerate the GROUP BY cells of a grouped family together with its
/// ORDER BY. Row order here is arbitrary; the runner sorts after the fact.
pub fn grouped(name: &str, dims: &Dimensions) -> Result<(Vec<GroupRow>, OrderBy), BenchError> {
    let mut rows = Vec::new();
    match name {
        "2.1" | "2.2" | "2.3" => {
            // brand number range and supplier region vary per family
            let (seq, brandnums, region) = match name {
                "2.1" => (2u64, 0..40u64, dims.region_id("AMERICA")?),
                "2.2" => (7, 20..28, dims.region_id("ASIA")?),
                _ => (7, 20..21, dims.region_id("EUROPE")?),
            };
            let cat_lo = dims.brands_of_category(seq).start;
            for year in dims.years() {
                let year_id = dims.year_id(year)?;
                for brandnum in brandnums.clone() {
                    let brand_id = cat_lo + brandnum;
                    rows.push(GroupRow {
                        year,
                        brandnum: Some(brandnum as i64),
                        brand: Some(dims.brand_label(brand_id)),
                        query: q2_cell(year_id, brand_id, region),
                        ..Default::default()
                    });
                }
            }
            Ok((rows, OrderBy::YearBrandnum))
        }
        "3.1" => {
            let asia = dims.nations_of_region(dims.region_id("ASIA")?);
            for year in dims.years().take(6) {
                let year_id = dims.year_id(year)?;
                for c_nation in asia.clone() {
                    for s_nation in asia.clone() {
                        rows.push(GroupRow {
                            year,
                            c_nation: Some(dims.nation_label(c_nation)?.to_string()),
                            s_nation: Some(dims.nation_label(s_nation)?.to_string()),
                            c_id: Some(c_nation),
                            s_id: Some(s_nation),
                            query: q3_nation_cell(year_id, c_nation, s_nation),
                            ..Default::default()
                        });
                    }
                }
            }
            Ok((rows, OrderBy::YearValueDesc))
        }
        "3.2" | "3.3" => {
            let cities: Vec<u64> = if name == "3.2" {
                dims.cities_of_nation(dims.nation_id("UNITED STATES")?).collect()
            } else {
                vec![dims.city_id("UNITED KI1")?, dims.city_id("UNITED KI5")?]
            };
            for year in dims.years().take(6) {
                let year_id = dims.year_id(year)?;
                for &c_city in &cities {
                    for &s_city in &cities {
                        rows.push(GroupRow {
                            year,
                            c_city: Some(dims.city_label(c_city)?.to_string()),
                            s_city: Some(dims.city_label(s_city)?.to_string()),
                            c_id: Some(c_city),
                            s_id: Some(s_city),
                            query: q3_city_cell(year_id, c_city, s_city),
                            ..Default::default()
                        });
                    }
                }
            }
            Ok((rows, OrderBy::YearValueDesc))
        }
        "3.4" => {
            // december 1997 only
            let year = 1997;
            let year_id = dims.year_id(year)?;
            let cities = [dims.city_id("UNITED KI1")?, dims.city_id("UNITED KI5")?];
            for &c_city in &cities {
                for &s_city in &cities {
                    rows.push(GroupRow {
                        year,
                        c_city: Some(dims.city_label(c_city)?.to_string()),
                        s_city: Some(dims.city_label(s_city)?.to_string()),
                        c_id: Some(c_city),
                        s_id: Some(s_city),
                        query: q3_city_month_cell(year_id, 11, c_city, s_city),
                        ..Default::default()
                    });
                }
            }
            Ok((rows, OrderBy::YearValueDesc))
        }
        "4.1" => {
            let america = dims.nations_of_region(dims.region_id("AMERICA")?);
            for year in dims.years() {
                let year_id = dims.year_id(year)?;
                for c_nation in america.clone() {
                    rows.push(GroupRow {
                        year,
                        c_nation: Some(dims.nation_label(c_nation)?.to_string()),
                        c_id: Some(c_nation),
                        query: q4_1_cell(year_id, c_nation),
                        ..Default::default()
                    });
                }
            }
            Ok((rows, OrderBy::YearCNation))
        }
        "4.2" => {
            let america = dims.nations_of_region(dims.region_id("AMERICA")?);
            for year in [1997, 1998] {
                let year_id = dims.year_id(year)?;
                for s_nation in america.clone() {
                    for category in 0..10u64 {
                        rows.push(GroupRow {
                            year,
                            s_nation: Some(dims.nation_label(s_nation)?.to_string()),
                            s_id: Some(s_nation),
                            category: Some(category as i64),
                            query: q4_2_cell(year_id, s_nation, category),
                            ..Default::default()
                        });
                    }
                }
            }
            Ok((rows, OrderBy::YearSNationCategory))
        }
        "4.3" => {
            let cities = dims.cities_of_nation(dims.nation_id("UNITED STATES")?);
            let brands = dims.brands_of_category(4);
            for year in [1997, 1998] {
                let year_id = dims.year_id(year)?;
                for s_city in cities.clone() {
                    for brand_id in brands.clone() {
                        rows.push(GroupRow {
                            year,
                            s_city: Some(dims.city_label(s_city)?.to_string()),
                            s_id: Some(s_city),
                            brandnum: Some(brand_id as i64),
                            brand: Some(dims.brand_label(brand_id)),
                            query: q4_3_cell(year_id, s_city, brand_id),
                            ..Default::default()
                        });
                    }
                }
            }
            Ok((rows, OrderBy::YearSCityBrand))
        }
        _ => Err(BenchError::UnknownFamily(name.to_string())),
    }
}
