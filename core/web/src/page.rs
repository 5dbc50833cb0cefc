//! Single-page HTML front end.
//!
//! Plain forms against the JSON and download routes; no script required
//! except for rendering listing and action results inline.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Google Drive File Manager</title>
<style>
  body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }
  section { border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }
  label { display: block; margin: 0.5rem 0; }
  table { border-collapse: collapse; width: 100%; margin-top: 0.5rem; }
  td, th { border: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: left; }
  pre { background: #f6f6f6; padding: 0.5rem; white-space: pre-wrap; }
</style>
</head>
<body>
<h1>Google Drive File Manager</h1>

<section>
  <h2>Upload File</h2>
  <form id="upload-form" action="/api/upload" method="post" enctype="multipart/form-data">
    <label>Folder Name (leave blank for root) <input type="text" name="folder"></label>
    <label>Choose files <input type="file" name="files" multiple required></label>
    <button type="submit">Upload/Update</button>
  </form>
  <pre id="upload-result" hidden></pre>
</section>

<section>
  <h2>Read Files</h2>
  <form id="read-form" action="/api/files" method="get">
    <label>Folder Name (leave blank for root) <input type="text" name="folder"></label>
    <button type="submit">Read Files</button>
    <button type="submit" formaction="/api/files/export">Download Excel</button>
  </form>
  <div id="read-result"></div>
</section>

<section>
  <h2>Download Files</h2>
  <form action="/api/archive" method="get">
    <label>Folder Name (leave blank for root) <input type="text" name="folder"></label>
    <button type="submit">Download ZIP</button>
  </form>
</section>

<section>
  <h2>Delete File</h2>
  <form id="delete-form" action="/api/delete" method="post">
    <label>File Name <input type="text" name="file_name" required></label>
    <label>Folder Name (leave blank for root) <input type="text" name="folder"></label>
    <button type="submit">Delete</button>
  </form>
  <pre id="delete-result" hidden></pre>
</section>

<script>
function show(id, text) {
  const el = document.getElementById(id);
  el.textContent = text;
  el.hidden = false;
}

document.getElementById("upload-form").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  const res = await fetch(ev.target.action, { method: "POST", body: new FormData(ev.target) });
  show("upload-result", JSON.stringify(await res.json(), null, 2));
});

document.getElementById("read-form").addEventListener("submit", async (ev) => {
  if (ev.submitter && ev.submitter.getAttribute("formaction")) return;
  ev.preventDefault();
  const params = new URLSearchParams(new FormData(ev.target));
  const res = await fetch(ev.target.action + "?" + params);
  const body = await res.json();
  const out = document.getElementById("read-result");
  out.replaceChildren();
  if (!res.ok) { out.textContent = body.error; return; }
  if (body.files.length === 0) { out.textContent = "No files found."; return; }
  const table = document.createElement("table");
  table.insertRow().append(...["ID", "File Name", "File Type"].map((h) => {
    const th = document.createElement("th"); th.textContent = h; return th;
  }));
  for (const f of body.files) {
    const row = table.insertRow();
    for (const v of [f.id, f.title, f.mime_type]) row.insertCell().textContent = v;
  }
  out.append(table);
});

document.getElementById("delete-form").addEventListener("submit", async (ev) => {
  ev.preventDefault();
  const res = await fetch(ev.target.action, {
    method: "POST",
    body: new URLSearchParams(new FormData(ev.target)),
  });
  show("delete-result", JSON.stringify(await res.json(), null, 2));
});
</script>
</body>
</html>
"##;
