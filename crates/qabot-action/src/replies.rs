//! User-facing reply texts.

pub const QUESTION_ADDED: &str = "Вопрос успешно добавлен";
pub const ANSWER_ADDED: &str = "Ответ успешно добавлен";
pub const CANCELLED: &str = "Команда успешно отменена";
pub const DRAFT_GONE: &str = "К сожалению, ваш вопрос был удален из временной базы";
pub const QUESTION_CLOSED_BY_BUTTON: &str = "Вопрос успешно закрыт";

pub const APP_ERROR: &str = "Ошибка приложения";
pub const STORAGE_ERROR: &str = "Ошибка доступа к базе данных";
pub const NO_PERMISSION: &str = "Недостаточно прав";
pub const BAD_COMMAND_FORMAT: &str = "Неверный формат команды";
pub const BAD_QUERY_FORMAT: &str = "Неправильный формат команды";
pub const QUESTION_NOT_FOUND: &str = "Вопрос с таким id не существует";
pub const ANSWER_NOT_FOUND: &str = "Ответ с таким id не существует";
pub const UNKNOWN_COMMAND: &str = "Неверная команда";
pub const COMMAND_NOT_EXISTS: &str = "Данной команды не существует";

pub const QUESTION_CLOSED: &str = "Вопрос закрыт";
pub const QUESTION_OPENED: &str = "Вопрос открыт";
pub const QUESTION_DELETED: &str = "Вопрос удален";
pub const ANSWER_DELETED: &str = "Ответ удален";
pub const NO_QUESTIONS: &str = "Нет вопросов";
pub const NO_ANSWERS: &str = "Нет ответов";

pub const ENTER_COMMAND: &str = "Введите команду";
pub const EMPTY_MESSAGE: &str = "__ Пустое сообщение";
pub const CONFIRM_PROMPT: &str = "Нажмите на кнопку, чтобы подтвердить действие";
pub const SEND_TITLE: &str = "Отправить";
pub const CONFIRM_BUTTON: &str = "Подтвердить";
pub const CANCEL_BUTTON: &str = "Отменить";
pub const CLOSE_BUTTON: &str = "Закрыть вопрос";

pub const GREETING: &str = "Привет, я телеграм бот, созданный для управления чатами групп ФББ";

pub const HELP: &str = "Команды:
/question <текст> - задать вопрос всем
/question_to @user <текст> - задать вопрос участнику
/answer <id> <текст> - ответить на вопрос
/close <id> - закрыть вопрос
/open <id> - открыть вопрос
/list_questions - открытые вопросы ко всем
/list_questions_to_me - открытые вопросы ко мне
/list_my_questions - мои открытые вопросы
/list_answers <id> - ответы на вопрос
/list_answers_to_me - ответы на мои вопросы
/delete_question <id> - удалить вопрос
/delete_answer <id> - удалить ответ";
