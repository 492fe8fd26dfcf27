use std::error::Error;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

// ============================================================================
// PAGE FETCHER
// ============================================================================
//
// Primary transport shells out to curl with a desktop browser User-Agent; the
// registry's paginated views depend on cookie/session affinity and curl has
// proven more reliable against its anti-automation heuristics than an
// in-process client. A plain reqwest GET/POST is kept as the single-retry
// fallback for when the binary is missing or the subprocess fails.

/// Desktop browser identity presented on every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// Per-request timeout, applied to both transports.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// QUERY RE-ENCODING
// ============================================================================

/// Percent-encodes `+` and `=` inside the already-decoded query component of
/// a URL, so the registry's server does not re-interpret them as form syntax.
/// The first `=` of each `key=value` pair is kept as the separator.
pub fn reencode_query(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some(parts) => parts,
        None => return url.to_string(),
    };

    let encoded: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => format!("{}={}", encode_component(key), encode_component(value)),
            None => encode_component(pair),
        })
        .collect();

    format!("{}?{}", base, encoded.join("&"))
}

fn encode_component(s: &str) -> String {
    s.replace('+', "%2B").replace('=', "%3D")
}

// ============================================================================
// FETCHING
// ============================================================================

/// Fetches a URL's HTML via GET. Subprocess first, in-process retry, error if
/// both fail — the caller decides whether that is fatal to its unit of work.
pub async fn fetch(url: &str) -> Result<String, Box<dyn Error>> {
    let url = reencode_query(url);

    match curl_get(&url).await {
        Ok(html) => Ok(html),
        Err(e) => {
            debug!(url = %url, error = %e, "subprocess fetch failed, retrying in-process");
            http_get(&url).await
        }
    }
}

/// Issues a stateful form POST (the registry's postback pagination) and
/// returns the resulting HTML.
pub async fn post_form(url: &str, fields: &[(String, String)]) -> Result<String, Box<dyn Error>> {
    match curl_post(url, fields).await {
        Ok(html) => Ok(html),
        Err(e) => {
            debug!(url = %url, error = %e, "subprocess post failed, retrying in-process");
            http_post(url, fields).await
        }
    }
}

// ============================================================================
// TRANSPORTS
// ============================================================================

async fn curl_get(url: &str) -> Result<String, Box<dyn Error>> {
    let output = Command::new("curl")
        .args(["-sS", "-L", "--max-time"])
        .arg(REQUEST_TIMEOUT_SECS.to_string())
        .args(["-A", USER_AGENT])
        .arg(url)
        .output()
        .await?;

    curl_body(output)
}

async fn curl_post(url: &str, fields: &[(String, String)]) -> Result<String, Box<dyn Error>> {
    let mut command = Command::new("curl");
    command
        .args(["-sS", "-L", "--max-time"])
        .arg(REQUEST_TIMEOUT_SECS.to_string())
        .args(["-A", USER_AGENT]);

    for (key, value) in fields {
        command.arg("--data-urlencode");
        command.arg(format!("{}={}", key, value));
    }

    let output = command.arg(url).output().await?;
    curl_body(output)
}

fn curl_body(output: std::process::Output) -> Result<String, Box<dyn Error>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("curl exited with {}: {}", output.status, stderr.trim()).into());
    }

    let body = String::from_utf8_lossy(&output.stdout).into_owned();
    if body.trim().is_empty() {
        return Err("curl returned an empty body".into());
    }

    Ok(body)
}

fn http_client() -> Result<reqwest::Client, Box<dyn Error>> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

async fn http_get(url: &str) -> Result<String, Box<dyn Error>> {
    let response = http_client()?.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

async fn http_post(url: &str, fields: &[(String, String)]) -> Result<String, Box<dyn Error>> {
    let response = http_client()?
        .post(url)
        .form(&fields.to_vec())
        .send()
        .await?
        .error_for_status()?;
    Ok(response.text().await?)
}

// ============================================================================
// TESTS
// ============================================================================
