//! HTML shown in the OAuth popup

const STYLE: &str = r"
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
      display: flex;
      justify-content: center;
      align-items: center;
      height: 100vh;
      margin: 0;
      background: #f8fafc;
      color: #1e3a8a;
    }
    .container {
      text-align: center;
      padding: 2rem;
      background: white;
      border-radius: 8px;
      box-shadow: 0 4px 6px rgba(0,0,0,0.1);
    }
    .mark { font-size: 3rem; margin-bottom: 1rem; }
    .ok { color: #10b981; }
    .err { color: #ef4444; }
";

/// A string as a JS literal that is safe inside a `<script>` element
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace("</", "<\\/")
}

/// Page that posts `GITHUB_AUTH_SUCCESS` to the opener and closes itself
///
/// The message is only delivered if the opener's origin matches
/// `target_origin`.
pub fn success_page(token: &str, username: &str, target_origin: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>GitHub Authorization Success</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
    <div class="mark ok">&#10003;</div>
    <h1>Authorization Successful!</h1>
    <p>You can close this window and return to the extension.</p>
  </div>
  <script>
    if (window.opener) {{
      window.opener.postMessage({{
        type: 'GITHUB_AUTH_SUCCESS',
        token: {token},
        username: {username}
      }}, {origin});
      setTimeout(() => window.close(), 2000);
    }}
  </script>
</body>
</html>
"#,
        token = js_string(token),
        username = js_string(username),
        origin = js_string(target_origin),
    )
}

/// Page shown when the exchange fails
pub fn failure_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Authorization Failed</title>
  <style>{STYLE}</style>
</head>
<body>
  <div class="container">
    <div class="mark err">&#10007;</div>
    <h1>Authorization Failed</h1>
    <p>Please try again.</p>
  </div>
</body>
</html>
"#
    )
}
