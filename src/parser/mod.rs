pub mod naver_parser;

pub use naver_parser::{
    merge_months, parse_complex_detail, parse_complex_nos, parse_real_price_page, parse_regions,
};
