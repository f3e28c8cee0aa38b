use crate::{Document, Downloader, ErrorKind, HostKey, Result};

::test_utils::graph_downloader!();
