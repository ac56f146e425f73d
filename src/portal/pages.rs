//! Static pages served by the setup portal.

use std::io::{self, Write};

pub const CONFIG_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Weather Station Setup</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
body { font-family: Arial; margin: 0; padding: 20px; }
h1 { color: #0066cc; }
.form-group { margin-bottom: 15px; }
label { display: block; margin-bottom: 5px; }
input[type="text"], input[type="password"] { width: 100%; padding: 8px; box-sizing: border-box; }
button { background-color: #0066cc; color: white; border: none; padding: 10px 15px; cursor: pointer; }
.message { margin-top: 20px; padding: 10px; background-color: #e6f7ff; border-left: 4px solid #0066cc; }
</style>
</head>
<body>
<h1>Weather Station Wi-Fi Setup</h1>
<form method="POST" action="/save">
<div class="form-group">
<label for="ssid">Wi-Fi Name (SSID):</label>
<input type="text" id="ssid" name="ssid" maxlength="32" required>
</div>
<div class="form-group">
<label for="password">Wi-Fi Password:</label>
<input type="password" id="password" name="password" maxlength="64" required>
</div>
<button type="submit">Save Configuration</button>
</form>
<div class="message">
<p>After saving, the weather station will restart and connect to your Wi-Fi network.</p>
<p>If connection fails, it will return to setup mode automatically.</p>
</div>
</body>
</html>
"#;

pub const SAVED_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Configuration Saved</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
body { font-family: Arial; margin: 0; padding: 20px; text-align: center; }
h1 { color: #00cc66; }
.message { margin-top: 20px; padding: 20px; background-color: #e6fff2; border-left: 4px solid #00cc66; text-align: left; }
</style>
<meta http-equiv="refresh" content="10;url=/" />
</head>
<body>
<h1>Configuration Saved Successfully!</h1>
<div class="message">
<p>Your Wi-Fi credentials have been saved.</p>
<p>The weather station will now restart and connect to your network.</p>
<p>Please wait while the device restarts...</p>
</div>
</body>
</html>
"#;

/// Write a complete `200 OK` HTML response and flush.
pub fn write_page<W: Write>(out: &mut W, body: &str) -> io::Result<()> {
    write!(
        out,
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    out.write_all(body.as_bytes())?;
    out.flush()
}
