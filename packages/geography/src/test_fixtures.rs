//! Fixture data for resolver tests: a slice of Michigan, plus the
//! geographies the correction table cares about.

use census_geo_geography_models::{Geoid, Release, releases};

use crate::memory::InMemoryGeographyStore;

pub const ACS2021: &str = "acs2021_5yr";

pub fn geoid(s: &str) -> Geoid {
    Geoid::parse(s).unwrap()
}

pub fn acs2021() -> Release {
    releases().get(ACS2021).unwrap().clone()
}

pub fn fixture_store() -> InMemoryGeographyStore {
    let geographies = [
        ("04000US06", "California"),
        ("04000US11", "District of Columbia"),
        ("04000US26", "Michigan"),
        ("04001US26", "Michigan -- Urban"),
        ("04000US72", "Puerto Rico"),
        ("05000US26125", "Oakland County, MI"),
        ("05000US26163", "Wayne County, MI"),
        ("05000US26999", "County not defined, MI"),
        ("06000US2616322000", "Detroit city, Wayne County, MI"),
        ("14000US26163511400", "Census Tract 5114, Wayne, MI"),
        ("14000US26163511500", "Census Tract 5115, Wayne, MI"),
        ("14000US26163520100", "Census Tract 5201, Wayne, MI"),
        ("14000US26163520200", "Census Tract 5202, Wayne, MI"),
        ("14000US26163980000", "Census Tract 9800, Wayne, MI"),
        ("16000US2605920", "Belleville city, MI"),
        ("16000US2621000", "Dearborn city, MI"),
        ("16000US2622000", "Detroit city, MI"),
        ("16000US2674900", "Warren city, MI"),
        ("16000US1150000", "Washington city, DC"),
        ("31000US19820", "Detroit-Warren-Dearborn, MI Metro Area"),
    ];

    let edges = [
        // Places in the Detroit CBSA, one with a duplicate polygon.
        ("31000US19820", "16000US2622000", 100.0),
        ("31000US19820", "16000US2622000", 99.5),
        ("31000US19820", "16000US2621000", 98.0),
        ("31000US19820", "16000US2674900", 10.0),
        ("31000US19820", "16000US2605920", 10.01),
        // Tracts overlapping Detroit's county subdivision.
        ("06000US2616322000", "14000US26163511400", 60.0),
        ("06000US2616322000", "14000US26163511500", 100.0),
        ("06000US2616322000", "14000US26163980000", 5.0),
        ("06000US2616322000", "14000US26163520100", 10.0),
        ("06000US2616322000", "14000US26163520200", 10.01),
        // Parents of a Detroit tract, including rows the resolver must skip.
        ("86000US48226", "14000US26163511400", 60.0),
        ("16000US2622000", "14000US26163511400", 100.0),
        ("97000US2601103", "14000US26163511400", 100.0),
        ("99900US1", "14000US26163511400", 50.0),
        ("corrupt-row", "14000US26163511400", 20.0),
        ("01000US", "14000US26163511400", 100.0),
        ("05000US26163", "14000US26163511400", 100.0),
        ("86000US48227", "14000US26163511400", 3.0),
        // A Louisville tract.
        ("16000US2148000", "14000US21111004900", 100.0),
        ("17000US2148006", "14000US21111004900", 100.0),
        // Washington, DC.
        ("04000US11", "16000US1150000", 100.0),
        ("31000US47900", "16000US1150000", 80.0),
    ];

    let names = [
        ("04000US26", "Michigan"),
        ("04000US51", "Virginia"),
        ("05000US26163", "Wayne County, MI"),
        ("16000US2622000", "Detroit city, MI"),
        ("16000US1150000", "Washington city, DC"),
        ("31000US47900", "Washington-Arlington-Alexandria, DC-VA-MD-WV Metro Area"),
        ("86000US48226", "48226"),
        ("14000US26163511400", "Census Tract 5114, Wayne, MI"),
    ];

    let store = geographies
        .into_iter()
        .fold(InMemoryGeographyStore::new(), |store, (g, name)| {
            store.with_geography(ACS2021, geoid(g), name)
        });
    let store = edges
        .into_iter()
        .fold(store, |store, (parent, child, pct)| {
            store.with_edge(parent, geoid(child), pct)
        });
    names
        .into_iter()
        .fold(store, |store, (g, name)| store.with_name(geoid(g), name))
}
