#[tokio::main]
async fn main() {
    robot_competition_display_lib::run().await;
}
