use std::io;

#[tokio::main]
async fn main() -> io::Result<()> {
    kohler_scrape::run().await
}
