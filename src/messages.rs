//! Fixed texts shown to chat users.

pub const START: &str =
    "Привет! Отправь мне фото, и я добавлю к нему рамку 🎨, а затем попробую удалить фон!";
pub const UNKNOWN_COMMAND: &str = "Неизвестная команда.";
pub const SEND_PHOTO: &str = "Пожалуйста, отправьте мне фотографию.";

pub const PROCESSING: &str =
    "Ваше фото обрабатывается... Удаляю фон, это может занять немного времени.";
pub const RESULT_CAPTION: &str = "Ваша фотография с рамкой и удаленным фоном (без сжатия).";
pub const RESULT_FILE_NAME: &str = "framed_photo_no_bg.png";

pub const LINK_FAILED: &str =
    "Не удалось получить ссылку на вашу фотографию. Пожалуйста, попробуйте еще раз.";
pub const DOWNLOAD_FAILED: &str =
    "Не удалось скачать вашу фотографию. Пожалуйста, попробуйте еще раз.";
pub const DECODE_FAILED: &str = "Не удалось обработать формат вашей фотографии. Пожалуйста, отправьте изображение в формате JPG или PNG.";
pub const COMPOSITION_FAILED: &str = "Произошла ошибка при подготовке изображения к наложению рамки. Пожалуйста, попробуйте другую фотографию.";
pub const ENCODE_FAILED: &str = "Не удалось подготовить изображение для удаления фона.";
pub const REMOVAL_FAILED: &str = "Не удалось удалить фон. Возможно, проблема с сервисом или лимитами. Попробуйте другую фотографию позже.";
pub const GENERIC_FAILURE: &str =
    "Что-то пошло не так при обработке фотографии. Пожалуйста, попробуйте еще раз.";
