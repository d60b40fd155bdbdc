use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let listener = TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("failed to bind 127.0.0.1:3000");
    println!("mock record store listening on {}", listener.local_addr().unwrap());
    mock_store::run(listener).await.expect("server error");
}
