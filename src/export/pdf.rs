//! PDF assembly with lopdf: one page per planned page, one image XObject
//! per embedded panel.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use crate::error::ComicError;
use crate::export::layout::{PageSize, Rect};
use crate::export::payload::EmbeddedImage;

/// A panel image with its final position on the page.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub image: EmbeddedImage,
    pub rect: Rect,
}

fn assembly_error(err: lopdf::Error) -> ComicError {
    ComicError::DocumentAssemblyFailure(err.to_string())
}

fn image_stream(image: &EmbeddedImage) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.jpeg.clone(),
    )
    .with_compression(false)
}

/// Build the document. `pages` may contain empty pages (every panel on them
/// failed to embed); they are kept so page numbering stays stable.
pub fn assemble(
    page_size: PageSize,
    pages: &[Vec<PlacedImage>],
    title: &str,
) -> Result<Vec<u8>, ComicError> {
    if pages.is_empty() {
        return Err(ComicError::DocumentAssemblyFailure(
            "Document has no pages".to_string(),
        ));
    }
    let (page_w, page_h) = page_size.dimensions();

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for placed in pages {
        let mut xobjects = Dictionary::new();
        let mut operations = Vec::new();
        for (slot, item) in placed.iter().enumerate() {
            let name = format!("Im{}", slot + 1);
            let image_id = doc.add_object(image_stream(&item.image));
            xobjects.set(name.clone(), image_id);

            let rect = item.rect;
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    rect.width.into(),
                    0.0f32.into(),
                    0.0f32.into(),
                    rect.height.into(),
                    rect.x.into(),
                    rect.y.into(),
                ],
            ));
            operations.push(Operation::new(
                "Do",
                vec![Object::Name(name.into_bytes())],
            ));
            operations.push(Operation::new("Q", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(assembly_error)?,
        ));
        let resources_id = doc.add_object(dictionary! {
            "XObject" => xobjects,
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), page_w.into(), page_h.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
        "Producer" => Object::string_literal("educomic"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| {
        ComicError::DocumentAssemblyFailure(format!("Failed to serialize document: {}", e))
    })?;
    Ok(bytes)
}
