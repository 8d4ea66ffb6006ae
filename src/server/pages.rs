//! HTML pages for the upload form and the recognition result

/// Escape text for interpolation into HTML element content or quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Upload form served at `/`
pub fn upload_form() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>License Plate Recognition</title>
</head>
<body>
    <h1>Upload an Image</h1>
    <form action="/upload/" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept="image/*" required>
        <button type="submit">Upload</button>
    </form>
</body>
</html>
"#
    .to_string()
}

/// Result page showing the stored image and the recognized text
pub fn result_page(image_url: &str, text: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>License Plate Recognition - Result</title>
</head>
<body>
    <h1>Recognition Result</h1>
    <img src="{url}" alt="Uploaded image" style="max-width: 640px;">
    <p>Detected text: <strong id="plate-text">{text}</strong></p>
    <a href="/">Upload another image</a>
</body>
</html>
"#,
        url = escape_html(image_url),
        text = escape_html(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("AB 123"), "AB 123");
        assert_eq!(
            escape_html(r#"<b>"A&B"</b>'"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;&#x27;"
        );
    }

    #[test]
    fn test_upload_form_posts_file_field() {
        let form = upload_form();

        assert!(form.contains(r#"action="/upload/""#));
        assert!(form.contains(r#"enctype="multipart/form-data""#));
        assert!(form.contains(r#"name="file""#));
    }

    #[test]
    fn test_result_page_escapes_values() {
        let page = result_page("/uploads/a\"b.png", "<script>");

        assert!(page.contains(r#"src="/uploads/a&quot;b.png""#));
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
