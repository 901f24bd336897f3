//! End-to-end pipelines over local files through the default registry.

use std::io::Read;
use std::path::Path;

use bytes::Bytes;
use feature_stream::{make_transform, pipe, ConnectionOptions, Error, Mapped, Record, Registry};
use futures::{SinkExt, StreamExt, TryStreamExt};
use tempfile::TempDir;

fn sample_features() -> Vec<u8> {
    let mut data = String::from("{\"type\":\"FeatureCollection\",\"features\":[");
    for i in 0..200 {
        if i > 0 {
            data.push(',');
        }
        data.push_str(&format!(
            "{{\"type\":\"Feature\",\"id\":{i},\"geometry\":{{\"type\":\"Point\",\"coordinates\":[{i}.5,-{i}.25]}}}}"
        ));
    }
    data.push_str("]}");
    data.into_bytes()
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

async fn copy_through<F>(
    registry: &Registry,
    from: &str,
    from_options: &ConnectionOptions,
    to: &str,
    stage: F,
) -> Result<(), Error>
where
    F: feature_stream::Transform + 'static,
{
    let source = pipe(registry.from(from, from_options)?, stage);
    source.forward(registry.to(to, &ConnectionOptions::new())?).await
}

#[tokio::test]
async fn test_file_copy_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("output.json");
    std::fs::write(&input, sample_features()).unwrap();

    let registry = Registry::with_defaults();
    let options = ConnectionOptions::new();
    let source = registry.from(&path_str(&input), &options).unwrap();
    let sink = registry.to(&path_str(&output), &options).unwrap();
    source.forward(sink).await.unwrap();

    let written = std::fs::read(&output).unwrap();
    assert_eq!(written.len(), sample_features().len());
    assert_eq!(written, sample_features());
}

#[tokio::test]
async fn test_dropping_every_other_record_shrinks_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("filtered.json");
    std::fs::write(&input, sample_features()).unwrap();

    let mut index = 0usize;
    let stage = make_transform(move |record: Record| {
        index += 1;
        let keep = index % 2 == 1;
        async move { Ok::<_, Error>(if keep { Mapped::Keep(record) } else { Mapped::Drop }) }
    });
    let from_options = ConnectionOptions::new().with("buffer_size", "64");
    copy_through(
        &Registry::with_defaults(),
        &path_str(&input),
        &from_options,
        &path_str(&output),
        stage,
    )
    .await
    .unwrap();

    let written = std::fs::metadata(&output).unwrap().len() as usize;
    assert!(written > 0);
    assert!(written < sample_features().len());
}

#[tokio::test]
async fn test_duplicating_every_record_doubles_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("doubled.json");
    std::fs::write(&input, sample_features()).unwrap();

    let stage = make_transform(|record: Record| async move {
        Ok::<_, Error>(Mapped::Expand(vec![record.clone(), record]))
    });
    copy_through(
        &Registry::with_defaults(),
        &path_str(&input),
        &ConnectionOptions::new().with("buffer_size", "100"),
        &path_str(&output),
        stage,
    )
    .await
    .unwrap();

    let written = std::fs::metadata(&output).unwrap().len() as usize;
    assert_eq!(written, 2 * sample_features().len());
}

#[tokio::test]
async fn test_size_preserving_mutation_keeps_length() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("masked.json");
    std::fs::write(&input, sample_features()).unwrap();

    let stage = make_transform(|record: Record| async move {
        Ok::<_, Error>(Mapped::Keep(Bytes::from(vec![b'x'; record.len()])))
    });
    copy_through(
        &Registry::with_defaults(),
        &path_str(&input),
        &ConnectionOptions::new(),
        &path_str(&output),
        stage,
    )
    .await
    .unwrap();

    let written = std::fs::read(&output).unwrap();
    assert_eq!(written.len(), sample_features().len());
    assert!(written.iter().all(|b| *b == b'x'));
}

#[tokio::test]
async fn test_gzip_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let compressed = dir.path().join("features.json.gz");

    let registry = Registry::with_defaults();
    let options = ConnectionOptions::new();
    let mut sink = registry.to(&path_str(&compressed), &options).unwrap();
    for chunk in sample_features().chunks(1000) {
        sink.send(Bytes::copy_from_slice(chunk)).await.unwrap();
    }
    sink.close().await.unwrap();

    // The file on disk is a complete gzip member.
    let raw = std::fs::read(&compressed).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    let mut decoded = Vec::new();
    flate2::read::GzDecoder::new(&raw[..])
        .read_to_end(&mut decoded)
        .unwrap();
    assert_eq!(decoded, sample_features());

    // Reading it back through the registry decompresses transparently.
    let chunks: Vec<Bytes> = registry
        .from(&path_str(&compressed), &options)
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(chunks.concat(), sample_features());
}

#[tokio::test]
async fn test_transform_error_fails_the_copy() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    let output = dir.path().join("output.json");
    std::fs::write(&input, sample_features()).unwrap();

    let stage = make_transform(|_record: Record| async move {
        Err::<Mapped, _>(std::io::Error::other("rejected"))
    });
    let result = copy_through(
        &Registry::with_defaults(),
        &path_str(&input),
        &ConnectionOptions::new(),
        &path_str(&output),
        stage,
    )
    .await;
    assert!(matches!(result, Err(Error::Transform(_))));
}

#[tokio::test]
async fn test_missing_input_fails_before_data_flows() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let result = Registry::with_defaults().from(&path_str(&missing), &ConnectionOptions::new());
    assert!(matches!(result, Err(Error::Transport(_))));
}

#[tokio::test]
async fn test_unknown_scheme_is_never_treated_as_a_file() {
    let registry = Registry::with_defaults();
    let options = ConnectionOptions::new();

    assert!(matches!(
        registry.from("ftp://example.com/features.json", &options),
        Err(Error::NoPluginFound(_))
    ));
    assert!(matches!(
        registry.to("s3://bucket/features.json", &options),
        Err(Error::NoPluginFound(_))
    ));
    assert!(!Path::new("s3:").exists());
}

#[tokio::test]
async fn test_append_option_extends_existing_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("log.json");
    std::fs::write(&output, b"first;").unwrap();

    let registry = Registry::with_defaults();
    let options = ConnectionOptions::new().with("append", "true");
    let mut sink = registry.to(&path_str(&output), &options).unwrap();
    sink.send(Bytes::from_static(b"second;")).await.unwrap();
    sink.close().await.unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), b"first;second;");
}

#[tokio::test]
async fn test_source_stream_reports_chunks_lazily() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.json");
    std::fs::write(&input, sample_features()).unwrap();

    let options = ConnectionOptions::new().with("buffer_size", "512");
    let mut source = Registry::with_defaults()
        .from(&path_str(&input), &options)
        .unwrap();
    let first = source.next().await.unwrap().unwrap();
    assert!(!first.is_empty());
    assert!(first.len() <= 512);
}
