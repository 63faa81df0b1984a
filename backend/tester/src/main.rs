use anyhow::{Context, Result};
use clap::Parser;
use reqwest::{Client, StatusCode, header::LOCATION, multipart, redirect::Policy};

// 1x1 transparent PNG, stands in for a camera frame
const PLACEHOLDER_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAMAAS3mWtkAAAAASUVORK5CYII=";

/// Walks a running server through seed, verify and mark.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://localhost:3000")]
    base_url: String,

    #[arg(long, default_value = "alice.johnson@university.com")]
    email: String,

    #[arg(long, default_value = "Electronics")]
    branch: String,

    #[arg(long, default_value = "Internet of Things (IoT) and Machine Learning")]
    course_name: String,

    #[arg(long, default_value = "ME102")]
    course_code: String,

    /// Call /seed first
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::builder().redirect(Policy::none()).build()?;
    let base = args.base_url.trim_end_matches('/');

    if args.seed {
        let res = client
            .get(format!("{base}/seed"))
            .send()
            .await
            .context("seed request failed")?;
        println!("Seed: {} {}", res.status(), res.text().await?);
    }

    let res = client
        .post(format!("{base}/verify-teacher"))
        .form(&[
            ("email", args.email.as_str()),
            ("branch", args.branch.as_str()),
            ("courseName", args.course_name.as_str()),
            ("courseCode", args.course_code.as_str()),
        ])
        .send()
        .await
        .context("verify request failed")?;

    match res.status() {
        StatusCode::OK => println!("Verify: teacher verified"),
        status if status.is_redirection() => {
            let target = res
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("<none>");
            println!("Verify: rejected, redirected to {target}");
            return Ok(());
        }
        status => {
            println!("Verify: {status} {}", res.text().await?);
            return Ok(());
        }
    }

    let form = multipart::Form::new()
        .text("branch", args.branch.clone())
        .text("courseCode", args.course_code.clone())
        .text("image", PLACEHOLDER_IMAGE);

    let res = client
        .post(format!("{base}/mark-attendance"))
        .multipart(form)
        .send()
        .await
        .context("mark request failed")?;
    println!("Mark: {} {}", res.status(), res.text().await?);

    Ok(())
}
