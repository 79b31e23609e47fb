use crate::review::proof::{is_allowed_photo_type, validate_photo_size, MAX_PROOF_PHOTOS};
use leptos::logging::warn;
use leptos::*;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{File, FileReader, HtmlInputElement};

/// Reads `file` into a `data:` URL and hands it to `on_loaded`.
pub(crate) fn read_as_data_url(file: File, on_loaded: impl Fn(String) + 'static) {
    let Ok(reader) = FileReader::new() else {
        warn!("[UPLOAD] FileReader unavailable");
        return;
    };
    let loaded = reader.clone();
    let onload = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
        if let Some(data) = loaded.result().ok().and_then(|r| r.as_string()) {
            on_loaded(data);
        }
    });
    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();
    if reader.read_as_data_url(&file).is_err() {
        warn!("[UPLOAD] Could not read {}", file.name());
    }
}

/// Proof photo picker: JPG, PNG or WEBP, at most five, 10 MB each.
#[component]
pub fn ImageUpload(photos: RwSignal<Vec<String>>) -> impl IntoView {
    let error = create_rw_signal(None::<String>);

    let on_change = move |ev: web_sys::Event| {
        let input: HtmlInputElement = event_target(&ev);
        error.set(None);
        let Some(files) = input.files() else { return };
        let mut queued = photos.with_untracked(|p| p.len());
        for i in 0..files.length() {
            let Some(file) = files.get(i) else { continue };
            if queued >= MAX_PROOF_PHOTOS {
                error.set(Some(format!("You can upload at most {MAX_PROOF_PHOTOS} photos")));
                break;
            }
            if !is_allowed_photo_type(&file.type_()) {
                error.set(Some(format!("{}: only JPG, PNG and WEBP images are allowed", file.name())));
                continue;
            }
            if let Err(reason) = validate_photo_size(file.size() as usize) {
                error.set(Some(format!("{}: {reason}", file.name())));
                continue;
            }
            queued += 1;
            read_as_data_url(file, move |data| {
                photos.update(|p| {
                    if p.len() < MAX_PROOF_PHOTOS {
                        p.push(data);
                    }
                })
            });
        }
        input.set_value("");
    };

    view! {
        <div class="image-upload">
            <input
                type="file"
                accept="image/jpeg,image/png,image/webp"
                multiple=true
                disabled=move || photos.with(|p| p.len() >= MAX_PROOF_PHOTOS)
                on:change=on_change
            />
            <Show when=move || error.with(Option::is_some)>
                <p class="field-error">{move || error.get().unwrap_or_default()}</p>
            </Show>
            <div class="photo-previews">
                {move || {
                    photos
                        .get()
                        .into_iter()
                        .enumerate()
                        .map(|(index, src)| {
                            view! {
                                <figure class="photo-preview">
                                    <img src=src alt=format!("Proof photo {}", index + 1)/>
                                    <button
                                        type="button"
                                        on:click=move |_| photos.update(|p| {
                                            if index < p.len() {
                                                p.remove(index);
                                            }
                                        })
                                    >
                                        "Remove"
                                    </button>
                                </figure>
                            }
                        })
                        .collect_view()
                }}
            </div>
            <p class="hint">
                {move || format!("{} of {} photos", photos.with(Vec::len), MAX_PROOF_PHOTOS)}
            </p>
        </div>
    }
}
