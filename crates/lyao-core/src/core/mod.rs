pub mod calendar;
pub mod geometry;
pub mod io;
pub mod results;
pub mod site;
pub mod timing;
