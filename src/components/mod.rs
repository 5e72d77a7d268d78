mod camera;
mod scanner_page;

pub use self::scanner_page::ScannerPage;
