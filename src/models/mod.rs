pub mod account;
pub mod diagnosis;
pub mod doctor;
pub mod enums;
pub mod examination;
pub mod hospital_record;
pub mod patient;
pub mod report;

pub use account::*;
pub use diagnosis::*;
pub use doctor::*;
pub use examination::*;
pub use hospital_record::*;
pub use patient::*;
pub use report::*;
