mod nominatim;
mod table;

pub use nominatim::NominatimGeocoder;
pub use table::TableGeocoder;
