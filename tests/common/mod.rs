use trawler::{Document, Downloader, ErrorKind, HostKey, Result};

test_utils::graph_downloader!();

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
