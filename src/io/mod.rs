pub mod csv;
pub mod ini;
pub mod netcdf;
pub mod rainfall;
pub mod results;
