use clap::{Arg, Command};

pub const ARG_MEDIA_CLOUD_NAME: &str = "media-cloud-name";
pub const ARG_MEDIA_API_KEY: &str = "media-api-key";
pub const ARG_MEDIA_API_SECRET: &str = "media-api-secret";
pub const ARG_MEDIA_BASE_URL: &str = "media-base-url";
pub const ARG_MEDIA_TIMEOUT_SECONDS: &str = "media-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MEDIA_CLOUD_NAME)
                .long(ARG_MEDIA_CLOUD_NAME)
                .help("Media host cloud name")
                .env("KONTO_MEDIA_CLOUD_NAME")
                .required(true),
        )
        .arg(
            Arg::new(ARG_MEDIA_API_KEY)
                .long(ARG_MEDIA_API_KEY)
                .help("Media host API key")
                .env("KONTO_MEDIA_API_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_MEDIA_API_SECRET)
                .long(ARG_MEDIA_API_SECRET)
                .help("Media host API secret used to sign upload/destroy requests")
                .env("KONTO_MEDIA_API_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_MEDIA_BASE_URL)
                .long(ARG_MEDIA_BASE_URL)
                .help("Media host API base URL")
                .env("KONTO_MEDIA_BASE_URL")
                .default_value("https://api.cloudinary.com"),
        )
        .arg(
            Arg::new(ARG_MEDIA_TIMEOUT_SECONDS)
                .long(ARG_MEDIA_TIMEOUT_SECONDS)
                .help("Timeout for media host requests in seconds")
                .env("KONTO_MEDIA_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}
