//! The eight pedagogical CPU variants, each a thin [`crate::ControlUnit`]
//! implementation sharing the common fetch/execute skeleton and ALU.

pub mod mm0;
pub mod mm1;
pub mod mm2;
pub mod mm3;
pub mod mmm;
pub mod mmr;
pub mod mms;
pub mod mmv;

pub use mm0::Mm0;
pub use mm1::Mm1;
pub use mm2::Mm2;
pub use mm3::Mm3;
pub use mmm::MmM;
pub use mmr::MmR;
pub use mms::MmS;
pub use mmv::MmV;
