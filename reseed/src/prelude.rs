#![allow(unused_imports)]

pub use crate::config::*;
pub use crate::constants::*;
pub use crate::core::certificate::*;
pub use crate::core::keystore::*;
pub use crate::core::netdb::*;
pub use crate::core::seeds::*;
pub use crate::core::su3_cache::*;
pub use crate::core::su3_file::*;
pub use crate::core::su3_signature::*;
pub use crate::reseed_errors::*;
pub use crate::reseeder::*;
pub use crate::utils::*;
pub use crate::verify::*;
