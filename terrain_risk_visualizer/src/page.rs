// Server-rendered pages: the upload form, the analysis result and the error
// page. Each is a leptos component rendered to a string; leptos escapes every
// interpolated value, so client-supplied names and messages go in as-is.

use crate::summary::AnalysisSummary;
use leptos::*;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:760px;color:#222}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:4px 10px;text-align:left}\
.found{color:#b00020;font-weight:bold}.not-found{color:#2e7d32}\
img.upload{max-width:100%;border:1px solid #444}";

/// Everything the result page shows.
#[derive(Debug, Clone)]
pub struct ResultView<'a> {
    pub filename: &'a str,
    pub image_path: &'a str,
    pub summary: &'a AnalysisSummary,
    /// Base64-encoded PNG of the brightness histogram.
    pub histogram_png_base64: &'a str,
}

#[component]
fn Layout(#[prop(into)] title: String, children: Children) -> impl IntoView {
    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <title>{title}</title>
                <style>{STYLE}</style>
            </head>
            <body>{children()}</body>
        </html>
    }
}

#[component]
fn IndexPage(creator: String) -> impl IntoView {
    view! {
        <Layout title="Terrain risk analysis">
            <h1>"Terrain risk analysis"</h1>
            <p>"Upload an aerial or satellite photograph, or paste a link to one."</p>
            <form action="/upload" method="post" enctype="multipart/form-data">
                <p>
                    <label>"Image URL " <input type="url" name="image_url" size="60"/></label>
                </p>
                <p>
                    <label>"Or a file " <input type="file" name="image_file" accept="image/*"/></label>
                </p>
                <p>
                    <button type="submit">"Analyse"</button>
                </p>
            </form>
            <footer>
                <p>"Created by " {creator}</p>
            </footer>
        </Layout>
    }
}

#[component]
fn ResultPage(
    filename: String,
    image_path: String,
    summary: AnalysisSummary,
    histogram_png_base64: String,
) -> impl IntoView {
    let title = format!("Analysis of {filename}");
    let size = format!("{} × {} pixels", summary.width, summary.height);
    let chart_src = format!("data:image/png;base64,{histogram_png_base64}");
    let brightness = summary
        .mean_brightness
        .map(|mean| format!("Mean brightness {mean:.1} of 255"));

    let coverage = [
        ("Vegetation (green)", summary.percentages.vegetation_absence),
        ("Water (blue)", summary.percentages.water_presence),
        ("Bare soil (brown)", summary.percentages.bare_soil),
    ]
    .into_iter()
    .map(|(name, value)| {
        view! {
            <tr>
                <th>{name}</th>
                <td>{format!("{value:.2}%")}</td>
            </tr>
        }
    })
    .collect_view();

    let verdicts = summary
        .verdicts
        .into_iter()
        .map(|verdict| {
            let class = if verdict.found { "found" } else { "not-found" };
            view! {
                <tr>
                    <th>{verdict.label}</th>
                    <td class=class>{verdict.verdict}</td>
                </tr>
            }
        })
        .collect_view();

    view! {
        <Layout title=title>
            <h1>"Analysis of " {filename}</h1>
            <p><img class="upload" src=image_path alt="Uploaded image"/></p>
            <p>{size}</p>
            <h2>"Colour coverage"</h2>
            <table>{coverage}</table>
            <h2>"Risk report"</h2>
            <table>{verdicts}</table>
            <h2>"Brightness histogram"</h2>
            <p><img src=chart_src alt="Brightness histogram"/></p>
            <p>{brightness}</p>
            <p><a href="/">"Analyse another image"</a></p>
        </Layout>
    }
}

#[component]
fn ErrorPage(message: String) -> impl IntoView {
    view! {
        <Layout title="Error">
            <h1>"Could not analyse the image"</h1>
            <p class="error">{message}</p>
            <p><a href="/">"Back"</a></p>
        </Layout>
    }
}

fn render_page<F, N>(page: F) -> String
where
    F: FnOnce() -> N + 'static,
    N: IntoView,
{
    format!("<!DOCTYPE html>{}", leptos::ssr::render_to_string(page))
}

pub fn index_page(creator: &str) -> String {
    let creator = creator.to_string();
    render_page(move || view! { <IndexPage creator=creator/> })
}

pub fn result_page(view: &ResultView<'_>) -> String {
    let filename = view.filename.to_string();
    let image_path = view.image_path.to_string();
    let summary = view.summary.clone();
    let histogram_png_base64 = view.histogram_png_base64.to_string();
    render_page(move || {
        view! {
            <ResultPage
                filename=filename
                image_path=image_path
                summary=summary
                histogram_png_base64=histogram_png_base64
            />
        }
    })
}

pub fn error_page(message: &str) -> String {
    let message = message.to_string();
    render_page(move || view! { <ErrorPage message=message/> })
}
