// Entity Models
// Flat records mirroring the curated artifacts. No entity is mutated after
// creation; each pipeline run recomputes the full set from source truth.

pub mod airport;
pub mod continent;
pub mod country;

pub use airport::{Airport, AirportSet};
pub use continent::{continent_label, Continent, CONTINENT_LABELS};
pub use country::{Country, CountrySet};
