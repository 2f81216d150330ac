pub mod certificate;
pub mod keystore;
pub mod netdb;
pub mod seeds;
pub mod su3_cache;
pub mod su3_file;
pub mod su3_signature;
