#[macro_export]
macro_rules! site_config {
    ($name:expr, $pretty_name:expr, $kind:expr, $base_url:expr, $safe_base_url:expr, $api_url:expr, $beta_url:expr, $login_url:expr, $max_page_size:expr) => {
        SiteConfig {
            name: String::from($name),
            pretty_name: String::from($pretty_name),
            kind: $kind,
            user_agent: $kind.user_agent(),
            base_url: String::from($base_url),
            safe_base_url: $safe_base_url,
            api_url: String::from($api_url),
            beta_url: $beta_url,
            login_url: $login_url,
            max_page_size: $max_page_size,
        }
    };
}
