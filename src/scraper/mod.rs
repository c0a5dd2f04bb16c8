pub mod fetcher;
pub mod traits;

pub use fetcher::NaverLandProvider;
pub use traits::LandProvider;
